use figment::Jail;
use rig_config::{CompletionMode, RigConfig};

#[test]
fn env_vars_map_to_nested_sections() {
    Jail::expect_with(|jail| {
        let xdg = jail.directory().join("xdg");
        jail.set_env("XDG_CONFIG_HOME", xdg.display());
        jail.set_env("SCANRIG_SERVER__URL", "http://from-env:9000");
        jail.set_env("SCANRIG_SCANNER__EXECUTABLE", "/opt/scanner/run.sh");
        jail.set_env("SCANRIG_COMPLETION__POLICY", "poll");

        let config = RigConfig::load(None).expect("config loads");
        assert_eq!(config.server.url, "http://from-env:9000");
        assert_eq!(config.scanner.executable, "/opt/scanner/run.sh");
        assert_eq!(config.completion.policy, CompletionMode::Poll);
        Ok(())
    });
}

#[test]
fn env_beats_explicit_file() {
    Jail::expect_with(|jail| {
        let xdg = jail.directory().join("xdg");
        jail.set_env("XDG_CONFIG_HOME", xdg.display());
        jail.create_file(
            "rig.toml",
            r#"
[server]
url = "http://from-file:9000"
token = "file-token"
"#,
        )?;
        jail.set_env("SCANRIG_SERVER__TOKEN", "env-token");

        let config = RigConfig::load(Some(std::path::Path::new("rig.toml"))).expect("config loads");
        assert_eq!(config.server.url, "http://from-file:9000");
        assert_eq!(config.server.token, "env-token");
        Ok(())
    });
}
