//! Intune `win32LobApp` metadata object.

use crate::packager::{builder::SETUP_FILE_NAME, settings::PackageDetails};
use base64::{Engine as _, engine::general_purpose::STANDARD};
use serde::Serialize;

/// `win32LobApp` body posted to `deviceAppManagement/mobileApps`.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Win32LobApp {
    #[serde(rename = "@odata.type")]
    pub odata_type: &'static str,
    pub display_name: String,
    pub description: String,
    pub publisher: String,
    pub developer: String,
    /// Shown as the app version in the portal
    pub display_version: String,
    pub install_command_line: String,
    pub uninstall_command_line: String,
    pub file_name: String,
    pub setup_file_path: String,
    pub applicable_architectures: &'static str,
    pub minimum_supported_windows_release: &'static str,
    #[serde(rename = "minimumFreeDiskSpaceInMB")]
    pub minimum_free_disk_space_in_mb: u32,
    #[serde(rename = "minimumMemoryInMB")]
    pub minimum_memory_in_mb: u32,
    pub minimum_number_of_processors: u32,
    #[serde(rename = "minimumCpuSpeedInMHz")]
    pub minimum_cpu_speed_in_mhz: u32,
    pub install_experience: InstallExperience,
    pub return_codes: Vec<ReturnCode>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub rules: Vec<PowerShellScriptRule>,
}

/// How Intune runs the installer.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct InstallExperience {
    pub run_as_account: &'static str,
    pub device_restart_behavior: &'static str,
}

/// Installer exit code mapping.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ReturnCode {
    pub return_code: i32,
    #[serde(rename = "type")]
    pub kind: &'static str,
}

/// Script-based detection rule.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PowerShellScriptRule {
    #[serde(rename = "@odata.type")]
    pub odata_type: &'static str,
    pub rule_type: &'static str,
    /// Base64 of the script's UTF-8 bytes
    pub script_content: String,
    pub enforce_signature_check: bool,
    pub run_as_32_bit: bool,
}

impl Win32LobApp {
    /// Builds the metadata object for `details`.
    ///
    /// Hardware and OS requirements are permissive, the install runs as
    /// SYSTEM with restarts suppressed, and exit codes 0 / 3010 map to
    /// success / soft reboot. A non-empty detection script becomes the single
    /// detection rule.
    pub fn from_details(details: &PackageDetails, package_file_name: &str) -> Self {
        let rules = details
            .detection_script
            .as_deref()
            .filter(|script| !script.is_empty())
            .map(|script| {
                vec![PowerShellScriptRule {
                    odata_type: "#microsoft.graph.win32LobAppPowerShellScriptRule",
                    rule_type: "detection",
                    script_content: STANDARD.encode(script.as_bytes()),
                    enforce_signature_check: false,
                    run_as_32_bit: false,
                }]
            })
            .unwrap_or_default();

        Self {
            odata_type: "#microsoft.graph.win32LobApp",
            display_name: details.app_name.clone(),
            description: details.display_description(),
            publisher: details.publisher.clone(),
            developer: details.publisher.clone(),
            display_version: details.version.clone(),
            install_command_line: details.install_cmd.clone(),
            uninstall_command_line: details.uninstall_cmd.clone(),
            file_name: package_file_name.to_string(),
            setup_file_path: SETUP_FILE_NAME.to_string(),
            applicable_architectures: "x86,x64",
            minimum_supported_windows_release: "1607",
            minimum_free_disk_space_in_mb: 0,
            minimum_memory_in_mb: 0,
            minimum_number_of_processors: 0,
            minimum_cpu_speed_in_mhz: 0,
            install_experience: InstallExperience {
                run_as_account: "system",
                device_restart_behavior: "suppress",
            },
            return_codes: vec![
                ReturnCode {
                    return_code: 0,
                    kind: "success",
                },
                ReturnCode {
                    return_code: 3010,
                    kind: "softReboot",
                },
            ],
            rules,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn details() -> PackageDetails {
        PackageDetails {
            app_name: "Agent".into(),
            publisher: "Contoso".into(),
            version: "4.2".into(),
            install_cmd: "msiexec /i agent.msi /qn".into(),
            uninstall_cmd: "msiexec /x {GUID} /qn".into(),
            ..Default::default()
        }
    }

    #[test]
    fn serializes_graph_shape() {
        let mut details = details();
        details.detection_script = Some("exit 0".into());
        let app = Win32LobApp::from_details(&details, "install.intunewin");
        let value = serde_json::to_value(&app).unwrap();

        assert_eq!(value["@odata.type"], "#microsoft.graph.win32LobApp");
        assert_eq!(value["displayName"], "Agent");
        assert_eq!(value["developer"], "Contoso");
        assert_eq!(value["displayVersion"], "4.2");
        assert_eq!(value["description"], "Contoso - 4.2");
        assert_eq!(value["fileName"], "install.intunewin");
        assert_eq!(value["setupFilePath"], "install.ps1");
        assert_eq!(value["minimumCpuSpeedInMHz"], 0);
        assert_eq!(value["minimumMemoryInMB"], 0);
        assert_eq!(
            value["installExperience"],
            json!({"runAsAccount": "system", "deviceRestartBehavior": "suppress"})
        );
        assert_eq!(
            value["returnCodes"],
            json!([
                {"returnCode": 0, "type": "success"},
                {"returnCode": 3010, "type": "softReboot"}
            ])
        );

        let rules = value["rules"].as_array().unwrap();
        assert_eq!(rules.len(), 1);
        assert_eq!(rules[0]["ruleType"], "detection");
        assert_eq!(rules[0]["scriptContent"], "ZXhpdCAw");
        assert_eq!(rules[0]["enforceSignatureCheck"], false);
        assert_eq!(rules[0]["runAs32Bit"], false);
    }

    #[test]
    fn no_detection_script_means_no_rules() {
        let app = Win32LobApp::from_details(&details(), "install.intunewin");
        assert!(app.rules.is_empty());
        let value = serde_json::to_value(&app).unwrap();
        assert!(value.get("rules").is_none());

        let mut empty = details();
        empty.detection_script = Some(String::new());
        assert!(Win32LobApp::from_details(&empty, "x").rules.is_empty());
    }
}
