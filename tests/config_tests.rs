// tests/config_tests.rs

use std::path::Path;

use figment::Jail;
use tacqubo::{Settings, TacError};

#[test]
fn defaults_when_nothing_is_configured() {
    Jail::expect_with(|_jail| {
        let settings = Settings::load().expect("defaults load");
        assert_eq!(settings, Settings::default());
        Ok(())
    });
}

#[test]
fn toml_file_overrides_defaults() {
    Jail::expect_with(|jail| {
        jail.create_file(
            "tacqubo.toml",
            r#"
                [solver]
                endpoint = "http://solver.test:9000/quantum"

                [script]
                step_budget = 5000

                [local]
                penalty = 12.5
            "#,
        )?;

        let settings = Settings::load().expect("config loads");
        assert_eq!(settings.solver.endpoint, "http://solver.test:9000/quantum");
        assert_eq!(settings.solver.timeout_secs, 10);
        assert_eq!(settings.script.step_budget, 5_000);
        assert_eq!(settings.script.max_call_depth, 64);
        assert_eq!(settings.local.penalty, Some(12.5));
        Ok(())
    });
}

#[test]
fn env_beats_toml() {
    Jail::expect_with(|jail| {
        jail.create_file("tacqubo.toml", "[solver]\ntimeout_secs = 30\n")?;
        jail.set_env("TACQUBO_SOLVER__TIMEOUT_SECS", "3");
        jail.set_env("TACQUBO_LOCAL__SEED", "7");

        let settings = Settings::load().expect("config loads");
        assert_eq!(settings.solver.timeout_secs, 3);
        assert_eq!(settings.local.seed, 7);
        Ok(())
    });
}

#[test]
fn call_depth_from_env_is_capped() {
    Jail::expect_with(|jail| {
        jail.set_env("TACQUBO_SCRIPT__MAX_CALL_DEPTH", "100000");

        let settings = Settings::load().expect("config loads");
        assert_eq!(settings.script.max_call_depth, 128);
        Ok(())
    });
}

#[test]
fn explicit_path_is_used_and_must_exist() {
    Jail::expect_with(|jail| {
        jail.create_file("alt.toml", "[local]\nexhaustive_limit = 4\n")?;

        let settings = Settings::load_from(Path::new("alt.toml")).expect("config loads");
        assert_eq!(settings.local.exhaustive_limit, 4);

        let missing = Settings::load_from(Path::new("nope.toml"));
        assert!(matches!(missing, Err(TacError::ConfigFileMissing { .. })));
        Ok(())
    });
}

#[test]
fn malformed_values_are_config_errors() {
    Jail::expect_with(|jail| {
        jail.create_file("tacqubo.toml", "[script]\nstep_budget = \"lots\"\n")?;

        let result = Settings::load();
        assert!(matches!(result, Err(TacError::Config(_))));
        Ok(())
    });
}
