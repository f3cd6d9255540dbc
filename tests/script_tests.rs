#[cfg(test)]
mod tests {
    use rstest::rstest;
    use std::path::PathBuf;
    use wastref::ast::ValueType;
    use wastref::runtime::{Config, Value};
    use wastref::wast::{Command, Report, Script, ScriptError, ScriptRunner};

    /*
     * Conformance scripts in JSON form.
     *
     * Every fixture under tests/scripts/ must run to completion with all
     * assertions passing. Scripts run on the test thread itself; deep
     * recursion must trap rather than overflow it.
     */

    fn run_script(script: Script, config: Config) -> Result<Report, ScriptError> {
        ScriptRunner::new(config)?.run(&script)
    }

    #[test]
    fn test_default_config_traps_runaway_recursion() {
        let report = run_script(load("recursion.json"), Config::default()).unwrap();
        assert!(report.is_success(), "{report}");
    }

    fn config() -> Config {
        Config {
            max_call_depth: 256,
            keep_going: true,
        }
    }

    #[rstest]
    fn test_script(#[files("tests/scripts/*.json")] path: PathBuf) {
        let script = Script::from_path(&path).unwrap();
        let assertions = script
            .commands
            .iter()
            .filter(|command| matches!(command, Command::AssertReturn { .. } | Command::AssertTrap { .. }))
            .count();

        let report = run_script(script, config()).unwrap();
        let file_name = path.file_name().unwrap().to_string_lossy();
        if !report.is_success() {
            let failures: Vec<String> = report
                .failures
                .iter()
                .map(|failure| format!("#{}: {}", failure.index, failure.message))
                .collect();
            panic!("FAIL {file_name}: {report}\n  {}", failures.join("\n  "));
        }
        assert_eq!(report.passed, assertions, "{file_name}: {report}");
    }

    fn load(name: &str) -> Script {
        Script::from_path(PathBuf::from("tests/scripts").join(name)).unwrap()
    }

    #[test]
    fn test_report_counts() {
        let report = run_script(load("linking.json"), config()).unwrap();
        assert_eq!(report.modules, 2);
        assert_eq!(report.registrations, 2);
        assert_eq!(report.skipped, 1);
        assert_eq!(report.passed, 11);
    }

    #[test]
    fn test_halts_on_first_failure() {
        let mut script = load("integer_arithmetic.json");
        if let Some(Command::AssertReturn { expected, .. }) = script.commands.get_mut(2) {
            expected[0] = wastref::wast::Const::new(ValueType::I32, "2").into();
        }
        let error = run_script(script, Config::default()).unwrap_err();
        assert!(
            matches!(error, ScriptError::AssertionFailed { index: 2, .. }),
            "unexpected error: {error}"
        );
    }

    #[test]
    fn test_instances_outlive_the_run() {
        let script = load("recursion.json");
        let mut runner = ScriptRunner::new(config()).unwrap();
        runner.run(&script).unwrap();
        let results = runner
            .interpreter_mut()
            .invoke(Some("$fac"), "fac-iter", &[Value::I64(10)])
            .unwrap();
        assert_eq!(results, vec![Value::I64(3_628_800)]);
    }
}
