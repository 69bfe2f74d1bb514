//! Integration tests for CLI commands

use std::process::Command;

/// Helper to run csarkit command
fn csarkit(args: &[&str]) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_csarkit"))
        .args(args)
        .output()
        .expect("Failed to execute csarkit")
}

/// Get the fixtures path
fn fixtures_path() -> &'static str {
    concat!(env!("CARGO_MANIFEST_DIR"), "/../../fixtures")
}

fn fixture(name: &str) -> String {
    format!("{}/{}", fixtures_path(), name)
}

fn stdout(output: &std::process::Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}

fn stderr(output: &std::process::Output) -> String {
    String::from_utf8_lossy(&output.stderr).to_string()
}

mod validate_command {
    use super::*;

    #[test]
    fn test_validate_service_with_warning() {
        let output = csarkit(&["validate", &fixture("vfw-service")]);

        assert!(output.status.success(), "Expected success, stderr: {}", stderr(&output));
        let stdout = stdout(&output);
        assert!(stdout.contains("Conformance level 4.0"));
        assert!(stdout.contains("JE201"));
        assert!(stdout.contains("vfw_monitor"));
        assert!(stdout.contains("Validation passed with 1 warning(s)"));
    }

    #[test]
    fn test_validate_strict_fails_on_warnings() {
        let output = csarkit(&["validate", &fixture("vfw-service"), "--strict"]);
        assert_eq!(output.status.code(), Some(2));
    }

    #[test]
    fn test_validate_json_output() {
        let output = csarkit(&["validate", &fixture("vfw-service"), "--json"]);

        assert!(output.status.success());
        let json: serde_json::Value =
            serde_json::from_str(&stdout(&output)).expect("Output should be valid JSON");

        assert_eq!(json["valid"], true);
        assert_eq!(json["conformanceLevel"], "4.0");
        assert_eq!(json["warnings"].as_array().unwrap().len(), 1);
        assert_eq!(json["warnings"][0]["code"], "JE201");
        assert_eq!(json["warnings"][0]["severity"], "WARNING");
        assert!(json["critical"].as_array().unwrap().is_empty());
    }

    #[test]
    fn test_validate_critical_issue() {
        let output = csarkit(&["validate", &fixture("invalid-service")]);

        assert_eq!(output.status.code(), Some(2));
        let stdout = stdout(&output);
        assert!(stdout.contains("JE008"));
        assert!(stdout.contains("must be at least"));
        assert!(stdout.contains("Validation failed: 1 critical issue(s)"));
    }

    #[test]
    fn test_validate_json_output_with_critical() {
        let output = csarkit(&["validate", &fixture("invalid-service"), "--json"]);

        let json: serde_json::Value =
            serde_json::from_str(&stdout(&output)).expect("Output should be valid JSON");
        assert_eq!(json["valid"], false);
        assert_eq!(json["critical"][0]["code"], "JE008");
    }

    #[test]
    fn test_validate_missing_entry_definitions() {
        let output = csarkit(&["validate", &fixture("missing-entry")]);

        assert_eq!(output.status.code(), Some(4));
        assert!(stderr(&output).contains("Entry definitions not found"));
    }

    #[test]
    fn test_validate_nonexistent_path() {
        let output = csarkit(&["validate", &fixture("does-not-exist")]);

        assert_eq!(output.status.code(), Some(4));
        assert!(stderr(&output).contains("Path is not valid"));
    }

    #[test]
    fn test_validate_with_config_override() {
        let dir = tempfile::TempDir::new().unwrap();
        let config = dir.path().join("severities.yaml");
        std::fs::write(
            &config,
            r#"
defaultConformanceLevel: "3.0"
validationIssues:
  JE201:
    - sinceConformanceLevel: "3.0"
      below: WARNING
      atOrAbove: CRITICAL
"#,
        )
        .unwrap();

        let output = csarkit(&[
            "validate",
            &fixture("vfw-service"),
            "--config",
            config.to_str().unwrap(),
        ]);
        assert_eq!(output.status.code(), Some(2));
        assert!(stdout(&output).contains("JE201"));
    }
}

mod show_command {
    use super::*;

    #[test]
    fn test_show_service() {
        let output = csarkit(&["show", &fixture("vfw-service")]);

        assert!(output.status.success(), "stderr: {}", stderr(&output));
        let stdout = stdout(&output);
        assert!(stdout.contains("vFW Service"));
        assert!(stdout.contains("Conformance Level: 4.0"));
        assert!(stdout.contains("Substitutes: org.openecomp.service.VfwService"));
        assert!(stdout.contains("vnf_config (map)"));
        assert!(stdout.contains("site_name (string) = paris"));
        assert!(stdout.contains("oam_network"));
        // Nested template nodes are indented under their VF
        assert!(stdout.contains("    - vfw_vfc"));
        assert!(stdout.contains("1 warning(s)"));
    }

    #[test]
    fn test_show_json() {
        let output = csarkit(&["show", &fixture("vfw-service"), "--json"]);

        assert!(output.status.success());
        let json: serde_json::Value =
            serde_json::from_str(&stdout(&output)).expect("Output should be valid JSON");

        assert_eq!(json["conformanceLevel"], "4.0");
        assert_eq!(json["metadata"]["name"], "vFW Service");
        let nodes = json["topology"]["nodeTemplates"].as_array().unwrap();
        assert_eq!(nodes.len(), 2);
        assert_eq!(nodes[0]["name"], "vFW 1.0-1");
        assert_eq!(
            nodes[0]["nestedTemplate"]["nodeTemplates"].as_array().unwrap().len(),
            3
        );
    }

    #[test]
    fn test_show_fails_on_critical_issues() {
        let output = csarkit(&["show", &fixture("invalid-service")]);

        assert_eq!(output.status.code(), Some(2));
        assert!(stderr(&output).contains("critical issue"));
    }
}

mod query_command {
    use super::*;

    #[test]
    fn test_query_by_metadata() {
        let output = csarkit(&["query", &fixture("vfw-service"), "--metadata", "type=VF"]);

        assert!(output.status.success(), "stderr: {}", stderr(&output));
        let stdout = stdout(&output);
        assert!(stdout.contains("vFW 1.0-1"));
        assert!(!stdout.contains("oam_network"));
        assert!(stdout.contains("1 result(s)"));
    }

    #[test]
    fn test_query_by_type_json() {
        let output = csarkit(&[
            "query",
            &fixture("vfw-service"),
            "--type",
            "org.openecomp.resource.vl.GenericNeutronNet",
            "--json",
        ]);

        let json: serde_json::Value =
            serde_json::from_str(&stdout(&output)).expect("Output should be valid JSON");
        let results = json.as_array().unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0]["name"], "oam_network");
        assert_eq!(results[0]["parent"], serde_json::Value::Null);
    }

    #[test]
    fn test_query_groups_within_vf() {
        let output = csarkit(&[
            "query",
            &fixture("vfw-service"),
            "--kind",
            "group",
            "--within",
            "vFW 1.0-1",
            "--json",
        ]);

        assert!(output.status.success());
        let json: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
        let results = json.as_array().unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0]["name"], "vfw..base_vfw..module-0");
        assert_eq!(results[0]["parent"], "vFW 1.0-1");
        assert_eq!(results[0]["kind"], "group");
    }

    #[test]
    fn test_query_cps_within_vf() {
        let output = csarkit(&[
            "query",
            &fixture("vfw-service"),
            "--metadata",
            "type=CP",
            "--within",
            "vFW 1.0-1",
        ]);

        let stdout = stdout(&output);
        assert!(stdout.contains("vfw_private_port"));
        assert!(stdout.contains("vfw_oam_port"));
        assert!(stdout.contains("2 result(s)"));
    }

    #[test]
    fn test_query_no_results() {
        let output = csarkit(&["query", &fixture("vfw-service"), "--type", "unknown.Type"]);

        assert!(output.status.success());
        assert!(stdout(&output).contains("No matching entities"));
    }

    #[test]
    fn test_query_within_node_without_nested_template() {
        let output = csarkit(&["query", &fixture("vfw-service"), "--within", "oam_network"]);

        assert_eq!(output.status.code(), Some(3));
        assert!(stderr(&output).contains("has no nested template"));
    }

    #[test]
    fn test_query_bad_metadata_filter() {
        let output = csarkit(&["query", &fixture("vfw-service"), "--metadata", "type"]);
        assert_eq!(output.status.code(), Some(64));
    }
}

mod get_command {
    use super::*;

    #[test]
    fn test_get_node_property_leaf() {
        let output = csarkit(&[
            "get",
            &fixture("vfw-service"),
            "nf_naming#ecomp_generated_naming",
            "--node",
            "vFW 1.0-1",
        ]);

        assert!(output.status.success(), "stderr: {}", stderr(&output));
        assert_eq!(stdout(&output).trim(), "true");
    }

    #[test]
    fn test_get_input_default() {
        let output = csarkit(&[
            "get",
            &fixture("vfw-service"),
            "vnf_config#default#flavors#name",
            "--input",
        ]);

        assert!(output.status.success());
        assert_eq!(stdout(&output).trim(), "m1.small");
    }

    #[test]
    fn test_get_input_without_default_selector() {
        let output = csarkit(&["get", &fixture("vfw-service"), "vnf_config#image", "--input"]);

        assert_eq!(output.status.code(), Some(3));
        assert!(stderr(&output).contains("default"));
    }

    #[test]
    fn test_get_nested_node_property() {
        let output = csarkit(&[
            "get",
            &fixture("vfw-service"),
            "port_vfw_private_ip_requirements#ip_count_required#count",
            "--node",
            "vfw_vfc",
            "--within",
            "vFW 1.0-1",
        ]);

        assert!(output.status.success(), "stderr: {}", stderr(&output));
        assert_eq!(stdout(&output).trim(), "1");
    }

    #[test]
    fn test_get_group_property() {
        let output = csarkit(&[
            "get",
            &fixture("vfw-service"),
            "min_vf_module_instances",
            "--group",
            "vfw101..base_vfw..module-0",
        ]);

        assert!(output.status.success());
        assert_eq!(stdout(&output).trim(), "1");
    }

    #[test]
    fn test_get_non_leaf_requires_raw() {
        let output = csarkit(&["get", &fixture("vfw-service"), "nf_naming", "--node", "vFW 1.0-1"]);
        assert_eq!(output.status.code(), Some(3));
        assert!(stderr(&output).contains("--raw"));

        let output = csarkit(&[
            "get",
            &fixture("vfw-service"),
            "nf_naming",
            "--node",
            "vFW 1.0-1",
            "--raw",
        ]);
        assert!(output.status.success());
        let json: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
        assert_eq!(json["ecomp_generated_naming"], true);
    }

    #[test]
    fn test_get_function_value_raw() {
        let output = csarkit(&[
            "get",
            &fixture("vfw-service"),
            "port_vfw_private_subnetpoolid",
            "--node",
            "vfw_vfc",
            "--within",
            "vFW 1.0-1",
            "--raw",
        ]);

        assert!(output.status.success());
        let json: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
        assert_eq!(json["get_input"], "private_pool");
    }

    #[test]
    fn test_get_unknown_node() {
        let output = csarkit(&["get", &fixture("vfw-service"), "nf_role", "--node", "missing"]);

        assert_eq!(output.status.code(), Some(3));
        assert!(stderr(&output).contains("No node template named 'missing'"));
    }

    #[test]
    fn test_get_requires_a_target() {
        let output = csarkit(&["get", &fixture("vfw-service"), "nf_role"]);
        assert!(!output.status.success());
    }
}
