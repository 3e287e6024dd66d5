use std::{path::Path, time::Duration};

use tokio::{
    fs::{self, File},
    io::AsyncWriteExt,
};

use crate::core::{
    common::FBX_APP_AUTH_HEADER,
    configuration::{
        get_configuration,
        sections::{ApplicationConfiguration, CoreConfiguration},
        Configuration,
    },
};

async fn create_sample_file(path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    if path.exists() {
        fs::remove_file(path)
            .await
            .expect("cannot remove sample configuration file");
    }

    let mut file = File::create(path)
        .await
        .expect("cannot create sample configuration file");
    let content = "[api]
# leave url unset to discover it from the host below
url = \"https://abcdefgh.fbxos.fr:12345/api/\"
host = \"mafreebox.freebox.fr\"
use_tls = true
# seconds
timeout = 3
session_header = \"X-Fbx-App-Auth\"

[application]
app_id = \"fr.freebox.test\"
app_name = \"Test\"
app_version = \"1.2.3\"
device_name = \"gateway-host\"

[registration]
auto = false
pooling_interval = 2
max_attempts = 30

[core]
data_directory = \".\"

[log]
level = \"Info\"
retention = 31";

    file.write_all(content.as_bytes())
        .await
        .expect("cannot write to sample configuration file");
    file.shutdown().await?;

    Ok(())
}

#[tokio::test]
async fn should_match_expected_values() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("test_conf.toml");

    create_sample_file(&path).await.unwrap();

    let conf = get_configuration(path.to_str().unwrap().to_string())
        .await
        .expect("cannot load configuration");

    assert_eq!(
        "https://abcdefgh.fbxos.fr:12345/api/",
        conf.api.url.clone().unwrap()
    );
    assert_eq!("mafreebox.freebox.fr", conf.discovery_host());
    assert_eq!(true, conf.api.use_tls.unwrap());
    assert_eq!(Duration::from_secs(3), conf.timeout());
    assert_eq!(FBX_APP_AUTH_HEADER, conf.session_header());

    assert_eq!("fr.freebox.test", conf.identity().app_id());
    assert_eq!("gateway-host", conf.identity().device_name());

    assert_eq!(false, conf.auto_register());
    let policy = conf.registration_policy(None);
    assert_eq!(Duration::from_secs(2), policy.pooling_interval);
    assert_eq!(30, policy.max_attempts);
    assert_eq!(
        Duration::from_secs(9),
        conf.registration_policy(Some(9)).pooling_interval
    );

    assert_eq!(".".to_string(), conf.data_directory());
    assert_eq!("Info", conf.log.level.unwrap());
    assert_eq!(31, conf.log.retention.unwrap());
}

#[tokio::test]
async fn empty_file_falls_back_to_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("empty.toml");
    fs::write(&path, "").await.unwrap();

    let conf = get_configuration(path.to_str().unwrap().to_string())
        .await
        .expect("cannot load configuration");

    assert_eq!(None, conf.api.url);
    assert_eq!("mafreebox.freebox.fr", conf.discovery_host());
    assert_eq!(Duration::from_secs(10), conf.timeout());
    assert_eq!(true, conf.auto_register());
    assert_eq!(100, conf.registration_policy(None).max_attempts);
    assert_eq!(Duration::from_secs(6), conf.registration_policy(None).pooling_interval);
    assert_eq!(31, conf.log_retention());
}

#[tokio::test]
async fn missing_or_corrupted_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("missing.toml");
    let corrupted = dir.path().join("corrupted.toml");
    fs::write(&corrupted, "[api\nurl = ").await.unwrap();

    assert!(get_configuration(missing.to_str().unwrap().to_string())
        .await
        .is_err());
    assert!(get_configuration(corrupted.to_str().unwrap().to_string())
        .await
        .is_err());
}

#[test]
fn assert_data_dir_permissions_tests() {
    let conf = Configuration {
        core: CoreConfiguration {
            data_directory: Some("nowhere".to_string()),
        },
        ..Default::default()
    };

    let conf2 = Configuration {
        core: CoreConfiguration {
            data_directory: Some("".to_string()),
        },
        ..Default::default()
    };

    let conf3 = Configuration {
        core: CoreConfiguration {
            data_directory: Some(".".to_string()),
        },
        ..Default::default()
    };

    assert_eq!(true, conf.assert_data_dir_permissions().is_err());
    assert_eq!(true, conf2.assert_data_dir_permissions().is_ok());
    assert_eq!(true, conf3.assert_data_dir_permissions().is_ok());
}

#[test]
fn assert_app_id_is_not_empty_tests() {
    let conf = Configuration::default();

    let conf2 = Configuration {
        application: ApplicationConfiguration {
            app_id: Some(" ".to_string()),
            ..Default::default()
        },
        ..Default::default()
    };

    let conf3 = Configuration {
        application: ApplicationConfiguration {
            app_id: Some("fr.freebox.test".to_string()),
            ..Default::default()
        },
        ..Default::default()
    };

    assert_eq!(Ok(()), conf.assert_app_id_is_not_empty());
    assert_eq!(Err(()), conf2.assert_app_id_is_not_empty());
    assert_eq!(Ok(()), conf3.assert_app_id_is_not_empty());
}

#[test]
fn validate_reports_first_failing_check() {
    let valid = Configuration::default();

    let blank_app_id = Configuration {
        application: ApplicationConfiguration {
            app_id: Some("".to_string()),
            ..Default::default()
        },
        ..Default::default()
    };

    let missing_dir = Configuration {
        core: CoreConfiguration {
            data_directory: Some("nowhere".to_string()),
        },
        ..Default::default()
    };

    assert!(valid.validate().is_ok());
    assert_eq!(
        "application.app_id cannot be empty",
        blank_app_id.validate().unwrap_err().to_string()
    );
    assert_eq!(
        "data dir does not exist",
        missing_dir.validate().unwrap_err().to_string()
    );
}
