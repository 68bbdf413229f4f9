//! Integration tests for python-installers

mod cli_tests {
    use assert_cmd::{cargo::cargo_bin_cmd, Command};
    use predicates::prelude::*;

    fn python_installers() -> Command {
        cargo_bin_cmd!("python-installers")
    }

    #[test]
    fn help_displays() {
        python_installers()
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("build"));
    }

    #[test]
    fn version_displays() {
        python_installers()
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains("python-installers"));
    }

    #[test]
    fn build_requires_arguments() {
        python_installers().arg("build").assert().failure();
    }
}

mod build_tests {
    use assert_cmd::{cargo::cargo_bin_cmd, Command};
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use predicates::prelude::*;
    use sha2::{Digest, Sha256};
    use std::fs;
    use std::path::{Path, PathBuf};
    use tempfile::TempDir;

    struct Workspace {
        temp: TempDir,
    }

    impl Workspace {
        fn new() -> Self {
            let temp = TempDir::new().unwrap();
            for dir in ["cnb", "layers", "platform"] {
                fs::create_dir_all(temp.path().join(dir)).unwrap();
            }
            Self { temp }
        }

        fn path(&self, relative: &str) -> PathBuf {
            self.temp.path().join(relative)
        }

        fn write_plan(&self, content: &str) {
            fs::write(self.path("plan.toml"), content).unwrap();
        }

        fn write_descriptor(&self, dependencies: &str) {
            let content = format!(
                r#"api = "0.8"

[buildpack]
id = "paketo-buildpacks/python-installers"
name = "Paketo Buildpack for Python Installers"
version = "1.2.3"
sbom-formats = ["application/vnd.cyclonedx+json"]

[metadata.default-versions]
uv = "0.5.*"

{}"#,
                dependencies
            );
            fs::write(self.path("cnb/buildpack.toml"), content).unwrap();
        }

        /// A uv release archive, returning its file URI and sha256.
        fn write_uv_archive(&self) -> (String, String) {
            let archive = self.path("uv-x86_64-unknown-linux-gnu.tar.gz");
            let file = fs::File::create(&archive).unwrap();
            let encoder = GzEncoder::new(file, Compression::default());
            let mut builder = tar::Builder::new(encoder);
            for (name, content) in [
                ("uv-x86_64-unknown-linux-gnu/uv", "#!/bin/sh\necho uv\n"),
                ("uv-x86_64-unknown-linux-gnu/uvx", "#!/bin/sh\necho uvx\n"),
            ] {
                let mut header = tar::Header::new_gnu();
                header.set_size(content.len() as u64);
                header.set_mode(0o755);
                header.set_cksum();
                builder.append_data(&mut header, name, content.as_bytes()).unwrap();
            }
            builder.into_inner().unwrap().finish().unwrap();

            let digest = hex::encode(Sha256::digest(fs::read(&archive).unwrap()));
            (format!("file://{}", archive.display()), digest)
        }

        fn build(&self) -> Command {
            let mut cmd = cargo_bin_cmd!("python-installers");
            cmd.arg("build")
                .arg(self.path("layers"))
                .arg(self.path("platform"))
                .arg(self.path("plan.toml"))
                .arg("--buildpack-dir")
                .arg(self.path("cnb"))
                .arg("--stack")
                .arg("io.buildpacks.stacks.jammy")
                .env("BP_ARCH", "amd64")
                .env_remove("BP_UV_VERSION")
                .env_remove("BP_LOG_LEVEL");
            cmd
        }
    }

    fn uv_dependency(uri: &str, sha: &str) -> String {
        format!(
            r#"[[metadata.dependencies]]
id = "uv"
name = "uv"
version = "0.5.1"
uri = "{}"
checksum = "sha256:{}"
stacks = ["*"]
arch = "amd64"
licenses = ["Apache-2.0", "MIT"]
purl = "pkg:generic/uv@0.5.1"
"#,
            uri, sha
        )
    }

    fn read(path: &Path) -> String {
        fs::read_to_string(path).unwrap()
    }

    #[test]
    fn empty_plan_fails() {
        let workspace = Workspace::new();
        workspace.write_descriptor("");
        workspace.write_plan("");

        workspace
            .build()
            .assert()
            .failure()
            .stderr(predicate::str::contains("empty plan should not happen"))
            .stderr(predicate::str::contains("Hint:"));
    }

    #[test]
    fn unknown_entry_fails() {
        let workspace = Workspace::new();
        workspace.write_descriptor("");
        workspace.write_plan("[[entries]]\nname = \"cpython\"\n");

        workspace
            .build()
            .assert()
            .failure()
            .stderr(predicate::str::contains("unknown plan: cpython"));
    }

    #[test]
    fn missing_descriptor_fails() {
        let workspace = Workspace::new();
        workspace.write_plan("[[entries]]\nname = \"uv\"\n");

        workspace
            .build()
            .assert()
            .failure()
            .stderr(predicate::str::contains("buildpack.toml"));
    }

    #[test]
    fn unavailable_version_fails() {
        let workspace = Workspace::new();
        let (uri, sha) = workspace.write_uv_archive();
        workspace.write_descriptor(&uv_dependency(&uri, &sha));
        workspace.write_plan("[[entries]]\nname = \"uv\"\n");

        workspace
            .build()
            .env("BP_UV_VERSION", "9.9.9")
            .assert()
            .failure()
            .stderr(predicate::str::contains("9.9.9"))
            .stderr(predicate::str::contains("0.5.1"));
    }

    #[test]
    fn installs_uv_and_reuses_it() {
        let workspace = Workspace::new();
        let (uri, sha) = workspace.write_uv_archive();
        workspace.write_descriptor(&uv_dependency(&uri, &sha));
        workspace.write_plan(
            "[[entries]]\nname = \"uv\"\n\n[entries.metadata]\nbuild = true\nlaunch = true\n",
        );

        workspace
            .build()
            .assert()
            .success()
            .stdout(predicate::str::contains("Resolving uv version"))
            .stdout(predicate::str::contains("Installing uv 0.5.1"));

        let layers = workspace.path("layers");
        assert_eq!(read(&layers.join("uv/bin/uv")), "#!/bin/sh\necho uv\n");
        assert!(layers.join("uv/bin/uvx").is_file());
        assert!(!layers.join("uv-temp-layer").exists());

        let sidecar = read(&layers.join("uv.toml"));
        assert!(sidecar.contains(&format!("sha256:{}", sha)));
        assert!(sidecar.contains("cache = true"));
        assert!(layers.join("uv.sbom.cdx.json").is_file());
        assert!(read(&layers.join("build.toml")).contains("name = \"uv\""));
        assert!(read(&layers.join("launch.toml")).contains("name = \"uv\""));

        workspace
            .build()
            .assert()
            .success()
            .stdout(predicate::str::contains("Reusing cached layer"))
            .stdout(predicate::str::contains("Executing build process").not());
        assert!(layers.join("uv/bin/uv").is_file());
    }

    #[test]
    fn checksum_mismatch_fails() {
        let workspace = Workspace::new();
        let (uri, _) = workspace.write_uv_archive();
        workspace.write_descriptor(&uv_dependency(&uri, &"0".repeat(64)));
        workspace.write_plan("[[entries]]\nname = \"uv\"\n");

        workspace
            .build()
            .assert()
            .failure()
            .stderr(predicate::str::contains("uv:"));
    }
}
