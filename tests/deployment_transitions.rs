// ABOUTME: Tests for deployment state transitions.
// ABOUTME: Verifies transition methods exist and return correct state types.

mod support;

use stevedore::deploy::{
    BackedUp, Completed, DeployError, Deployment, DeploymentReport, DeploymentRequest, Extracted,
    Fetched, Initialized, Installed, Started, Stopped, Validated,
};
use stevedore::diagnostics::WarningKind;
use support::fakes::{FakeSupervisor, bridge, file_fetcher};
use support::fixtures;

// =============================================================================
// Transition Type Signature Tests
// =============================================================================

/// Test: Verifies the type signatures of all transition methods compile correctly.
#[test]
fn transition_type_signatures_compile() {
    use std::path::Path;
    use stevedore::backup::{BackupArchive, BackupManager};
    use stevedore::fetch::Fetcher;
    use stevedore::health::HealthVerifier;
    use stevedore::install::Installer;
    use stevedore::supervisor::{SupervisorBridge, SupervisorTarget};
    use stevedore::types::AppName;

    // This function is never called, but it must compile.
    #[allow(dead_code, clippy::too_many_arguments)]
    async fn check_signatures(
        request: DeploymentRequest,
        app: &AppName,
        scratch: &Path,
        fetcher: &Fetcher,
        backups: &BackupManager,
        supervisors: &SupervisorBridge,
        target: &SupervisorTarget,
        installer: &Installer,
        verifier: &HealthVerifier,
        archive: &BackupArchive,
    ) {
        let d1: Result<Deployment<Initialized>, DeployError> =
            Deployment::new(request, app, scratch);
        let d2: Result<Deployment<Fetched>, DeployError> = d1.unwrap().fetch(fetcher).await;
        let d3: Result<Deployment<Validated>, DeployError> = d2.unwrap().validate().await;
        let d4: Result<Deployment<Extracted>, DeployError> = d3.unwrap().extract().await;

        // Backup failure is a warning, not an error
        let d5: Deployment<BackedUp> = d4.unwrap().back_up(backups, scratch).await;
        let d6: Deployment<Stopped> = d5.stop(supervisors, target).await;
        let d7: Result<Deployment<Installed>, DeployError> = d6.install(installer, scratch).await;
        let d8: Deployment<Started> = d7.unwrap().start(supervisors, target).await;
        let d9: Deployment<Completed> = d8.health_check(verifier).await;
        let _report: DeploymentReport = d9.finish();

        // Rollback enters the pipeline already backed up
        let _restored: Result<Deployment<BackedUp>, DeployError> =
            Deployment::<BackedUp>::restore(archive, app, scratch).await;
    }
}

// =============================================================================
// Driving transitions by hand
// =============================================================================

#[tokio::test]
async fn manual_pipeline_reaches_completed() {
    use stevedore::health::HealthVerifier;
    use stevedore::install::Installer;
    use stevedore::supervisor::SupervisorTarget;

    let root = tempfile::tempdir().unwrap();
    let config = support::test_config(root.path());
    let artifact = fixtures::wrapped_release(&root.path().join("v3.tar.gz"), "v3");
    let fetcher = file_fetcher(&artifact);
    let supervisor = FakeSupervisor::new("fake", true);
    let supervisors = bridge(&[supervisor.clone()]);
    let target = SupervisorTarget::from_config(&config);

    let request = DeploymentRequest::new("https://example.test/v3.tar.gz", "v3").unwrap();
    let deployment = Deployment::new(request, &config.app_name, &config.scratch_dir).unwrap();
    let workspace = deployment.workspace_root().to_path_buf();
    assert!(workspace.exists());

    let deployment = deployment.fetch(&fetcher).await.unwrap();
    let deployment = deployment.validate().await.unwrap();
    assert!(deployment.artifact().is_some());

    let deployment = deployment.extract().await.unwrap().without_backup();
    let deployment = deployment.stop(&supervisors, &target).await;
    let deployment = deployment
        .install(&Installer::from_config(&config), &config.live_dir)
        .await
        .unwrap();
    assert_eq!(deployment.entrypoint_hint(), Some("index.js"));

    let deployment = deployment.start(&supervisors, &target).await;
    let deployment = deployment
        .health_check(&HealthVerifier::from_config(&config.health))
        .await;
    assert!(deployment.diagnostics().contains(WarningKind::HealthUnconfirmed));

    let report = deployment.finish();
    assert_eq!(report.release, "v3");
    assert_eq!(report.supervisor, Some("fake"));
    assert!(report.backup.is_none());
    assert!(!workspace.exists());
    assert_eq!(supervisor.calls(), vec!["fake:stop", "fake:start:demo"]);
}

#[tokio::test]
async fn dropping_a_deployment_removes_its_workspace() {
    let root = tempfile::tempdir().unwrap();
    let config = support::test_config(root.path());
    let request = DeploymentRequest::new("https://example.test/v1.tar.gz", "v1").unwrap();

    let deployment = Deployment::new(request, &config.app_name, &config.scratch_dir).unwrap();
    let workspace = deployment.workspace_root().to_path_buf();
    drop(deployment);

    assert!(!workspace.exists());
}
