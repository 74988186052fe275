#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use tempfile::tempdir;

    fn run_external_runner() -> assert_cmd::Command {
        assert_cmd::cargo::cargo_bin_cmd!("sir-quant")
    }

    fn fixture(name: &str) -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR"))
            .join("tests")
            .join("data")
            .join(name)
    }

    fn stdout_of(command: &mut assert_cmd::Command) -> String {
        let output = command.output().unwrap();
        assert!(output.status.success());
        String::from_utf8(output.stdout).unwrap()
    }

    #[test]
    fn default_run_prints_indices_and_quanta() {
        let stdout = stdout_of(&mut run_external_runner());
        let lines: Vec<&str> = stdout.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("indices: [2, 2"));
        assert!(lines[1].starts_with("quanta: [-0.0625, -0.0625"));
        assert!(lines[2].starts_with("peak infected: "));
        // 160 samples, one per comma-separated entry
        assert_eq!(lines[0].matches(',').count(), 159);
    }

    #[test]
    fn config_file_and_output_dir() {
        let temp_dir = tempdir().unwrap();
        let stdout = stdout_of(
            run_external_runner()
                .arg("--config")
                .arg(fixture("short_run.json"))
                .arg("-o")
                .arg(temp_dir.path()),
        );

        // I(0) / N sits exactly on the first threshold and takes its index
        assert!(stdout.starts_with("indices: [0, "));
        assert!(stdout.lines().next().unwrap().ends_with(", 2]"));

        let trajectory = temp_dir.path().join("trajectory.csv");
        let quantized = temp_dir.path().join("quantized.csv");
        // Report paths are logged, never printed
        assert_eq!(stdout.lines().count(), 3);
        assert!(trajectory.exists() && quantized.exists());

        let mut reader = csv::Reader::from_path(&trajectory).unwrap();
        assert_eq!(
            reader.headers().unwrap().iter().collect::<Vec<_>>(),
            vec!["time", "susceptible", "infected", "removed"]
        );
        assert_eq!(reader.records().count(), 11);

        let mut reader = csv::Reader::from_path(&quantized).unwrap();
        assert_eq!(
            reader.headers().unwrap().iter().collect::<Vec<_>>(),
            vec!["time", "signal", "index", "quantum"]
        );
        assert_eq!(reader.records().count(), 11);
    }

    #[test]
    fn file_prefix_names_reports() {
        let temp_dir = tempdir().unwrap();
        let output = run_external_runner()
            .args(["-v", "--file-prefix", "baseline_"])
            .arg("--output-dir")
            .arg(temp_dir.path())
            .output()
            .unwrap();
        assert!(output.status.success());
        let trajectory = temp_dir.path().join("baseline_trajectory.csv");
        let quantized = temp_dir.path().join("baseline_quantized.csv");
        assert!(trajectory.exists());
        assert!(quantized.exists());

        let stderr = String::from_utf8(output.stderr).unwrap();
        assert!(stderr.contains(&format!("wrote report {}", trajectory.display())));
        assert!(stderr.contains(&format!("wrote report {}", quantized.display())));
        let stdout = String::from_utf8(output.stdout).unwrap();
        assert!(!stdout.contains("wrote"));
    }

    #[test]
    fn unsorted_partitions_fail() {
        let output = run_external_runner()
            .arg("--config")
            .arg(fixture("unsorted_partitions.json"))
            .output()
            .unwrap();
        assert!(!output.status.success());
        assert!(output.stdout.is_empty());
        let stderr = String::from_utf8(output.stderr).unwrap();
        assert!(stderr.contains("partitions"));
    }

    #[test]
    fn missing_config_fails() {
        run_external_runner()
            .args(["--config", "no/such/config.json"])
            .assert()
            .failure();
    }

    #[test]
    fn log_level_enables_module_logging() {
        let output = run_external_runner()
            .args(["--log-level", "sir_quant=info"])
            .output()
            .unwrap();
        assert!(output.status.success());
        let stderr = String::from_utf8(output.stderr).unwrap();
        assert!(stderr.contains("Logging enabled for sir_quant at level INFO"));
        assert!(stderr.contains("integrating SIR"));
        // Logging never reaches stdout
        let stdout = String::from_utf8(output.stdout).unwrap();
        assert!(stdout.starts_with("indices: ["));
    }

    #[test]
    fn verbosity_levels() {
        let output = run_external_runner().arg("-v").output().unwrap();
        let stderr = String::from_utf8(output.stderr).unwrap();
        assert!(stderr.contains("INFO"));
        assert!(!stderr.contains("DEBUG"));

        let output = run_external_runner().arg("-vv").output().unwrap();
        let stderr = String::from_utf8(output.stderr).unwrap();
        assert!(stderr.contains("DEBUG"));

        let output = run_external_runner().output().unwrap();
        assert!(output.stderr.is_empty());
    }
}
