//! Batch sync against emulated `crontab` and `schtasks` binaries.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use mediamgr_core::{Frequency, ScheduledTaskSpec, TimeOfDay};
use mediamgr_scheduler::{
    sync, CommandOutput, CommandRunner, CronBackend, SchedulerBackend, SchedulerError,
    SchtasksBackend,
};

fn spec(name: &str, time: &str) -> ScheduledTaskSpec {
    ScheduledTaskSpec {
        name: name.to_string(),
        command: format!("/usr/local/bin/mediamgr {}", name.to_lowercase()),
        frequency: Frequency::Daily,
        time: time.parse::<TimeOfDay>().unwrap(),
        enabled: true,
    }
}

fn ok(stdout: &str) -> CommandOutput {
    CommandOutput {
        status: Some(0),
        stdout: stdout.to_string(),
        stderr: String::new(),
    }
}

fn failed(stderr: &str) -> CommandOutput {
    CommandOutput {
        status: Some(1),
        stdout: String::new(),
        stderr: stderr.to_string(),
    }
}

// ---------------------------------------------------------------------------
// crontab
// ---------------------------------------------------------------------------

#[derive(Default)]
struct FakeCrontab {
    text: Mutex<Option<String>>,
    writes: Mutex<usize>,
}

impl FakeCrontab {
    fn with(text: &str) -> Arc<Self> {
        let fake = Self::default();
        *fake.text.lock().unwrap() = Some(text.to_string());
        Arc::new(fake)
    }

    fn text(&self) -> String {
        self.text.lock().unwrap().clone().unwrap_or_default()
    }

    fn writes(&self) -> usize {
        *self.writes.lock().unwrap()
    }
}

#[async_trait]
impl CommandRunner for FakeCrontab {
    async fn run(
        &self,
        program: &str,
        args: &[&str],
        stdin: Option<&str>,
    ) -> mediamgr_scheduler::Result<CommandOutput> {
        assert_eq!(program, "crontab");
        match args {
            ["-l"] => Ok(match self.text.lock().unwrap().as_ref() {
                Some(text) => ok(text),
                None => failed("no crontab for tester\n"),
            }),
            ["-"] => {
                *self.text.lock().unwrap() = Some(stdin.unwrap_or_default().to_string());
                *self.writes.lock().unwrap() += 1;
                Ok(ok(""))
            }
            other => panic!("unexpected crontab args {other:?}"),
        }
    }
}

#[tokio::test]
async fn installing_twice_leaves_one_marked_line() {
    let fake = Arc::new(FakeCrontab::default());
    let backend = CronBackend::new(fake.clone());
    let job = spec("MediaManager_Complete", "05:00");

    backend.install(&job).await.unwrap();
    backend.install(&job).await.unwrap();

    let text = fake.text();
    let marked: Vec<_> = text
        .lines()
        .filter(|l| l.contains("MediaManager_Complete"))
        .collect();
    assert_eq!(marked.len(), 1);
    assert!(marked[0].starts_with("0 5 * * * "));
    assert_eq!(fake.writes(), 1, "second install must not rewrite the crontab");
}

#[tokio::test]
async fn repeated_sync_is_stable_and_preserves_user_lines() {
    let user_line = "15 2 * * * /usr/bin/backup --nightly";
    let fake = FakeCrontab::with(&format!("MAILTO=me@example.org\n{user_line}\n"));
    let backend = CronBackend::new(fake.clone());
    let specs = [
        spec("MediaManager_generate_media_list", "05:00"),
        spec("MediaManager_check_missing_media", "05:30"),
    ];

    let first = sync(&backend, &specs).await;
    assert!(first.is_success());
    let after_first = fake.text();
    let writes_after_first = fake.writes();

    let second = sync(&backend, &specs).await;
    assert!(second.is_success());
    assert_eq!(fake.text(), after_first);
    assert_eq!(fake.writes(), writes_after_first);

    let names = backend.list_managed_jobs().await.unwrap().names();
    assert_eq!(
        names.into_iter().collect::<Vec<_>>(),
        [
            "MediaManager_check_missing_media",
            "MediaManager_generate_media_list"
        ]
    );
    assert!(after_first.starts_with("MAILTO=me@example.org\n"));
    assert!(after_first.contains(user_line));
}

#[tokio::test]
async fn sync_replaces_legacy_lines_and_drops_orphans() {
    let fake = FakeCrontab::with(concat!(
        "0 5 * * * \"/usr/bin/python3\" \"/opt/mm/generate_media_list.py\" --automated # MediaManager: MediaManager_generate_media_list\n",
        "0 6 * * * \"/usr/bin/python3\" \"/opt/mm/manage_files.py\" --automated # MediaManager: MediaManager_manage_file_retention\n",
    ));
    let backend = CronBackend::new(fake.clone());

    let report = sync(&backend, &[spec("MediaManager_CompleteCheck", "05:00")]).await;
    assert!(report.is_success());
    assert_eq!(report.outcomes.len(), 3);

    let text = fake.text();
    assert_eq!(text.lines().count(), 1);
    assert!(text.ends_with("# MediaManager:MediaManager_CompleteCheck\n"));
}

#[tokio::test]
async fn malformed_marker_lines_are_reported_and_kept() {
    let odd = "sometimes /opt/mm/run # MediaManager:MediaManager_generate_media_list";
    let fake = FakeCrontab::with(&format!("{odd}\n"));
    let backend = CronBackend::new(fake.clone());

    let report = sync(&backend, &[]).await;
    assert!(report.is_success());
    assert_eq!(report.issues.len(), 1);
    assert_eq!(fake.text(), format!("{odd}\n"));
}

#[tokio::test]
async fn removing_absent_job_is_ok() {
    let fake = Arc::new(FakeCrontab::default());
    let backend = CronBackend::new(fake.clone());
    backend.remove("MediaManager_never_installed").await.unwrap();
    assert_eq!(fake.writes(), 0);
}

#[tokio::test]
async fn remove_all_keeps_foreign_lines() {
    let fake = FakeCrontab::with(
        "15 2 * * * /usr/bin/backup\n0 5 * * * mm # MediaManager:MediaManager_a\n0 6 * * * mm # MediaManager:MediaManager_b\n",
    );
    let backend = CronBackend::new(fake.clone());
    let report = backend.remove_all_managed().await.unwrap();
    assert_eq!(report.outcomes.len(), 2);
    assert_eq!(fake.text(), "15 2 * * * /usr/bin/backup\n");
}

struct DeniedCrontab;

#[async_trait]
impl CommandRunner for DeniedCrontab {
    async fn run(
        &self,
        _program: &str,
        args: &[&str],
        _stdin: Option<&str>,
    ) -> mediamgr_scheduler::Result<CommandOutput> {
        Ok(match args {
            ["-l"] => failed("no crontab for tester\n"),
            _ => failed("You (tester) are not allowed to use this program (crontab)\n"),
        })
    }
}

#[tokio::test]
async fn cron_deny_is_a_privilege_error() {
    let backend = CronBackend::new(Arc::new(DeniedCrontab));
    let err = backend.install(&spec("MediaManager_a", "01:00")).await.unwrap_err();
    assert!(matches!(err, SchedulerError::Privilege { job, .. } if job == "MediaManager_a"));
}

// ---------------------------------------------------------------------------
// schtasks
// ---------------------------------------------------------------------------

#[derive(Default)]
struct FakeTaskStore {
    tasks: Mutex<BTreeMap<String, String>>,
    deny: Option<&'static str>,
    hang: Option<&'static str>,
}

#[async_trait]
impl CommandRunner for FakeTaskStore {
    async fn run(
        &self,
        program: &str,
        args: &[&str],
        _stdin: Option<&str>,
    ) -> mediamgr_scheduler::Result<CommandOutput> {
        assert_eq!(program, "schtasks");
        let mut tasks = self.tasks.lock().unwrap();
        match args {
            ["/Query", "/FO", "CSV", "/NH"] => {
                let mut out = String::from("\"\\Microsoft\\Windows\\Defrag\\ScheduledDefrag\",\"N/A\",\"Ready\"\r\n");
                for (name, time) in tasks.iter() {
                    out.push_str(&format!("\"\\{name}\",\"10/19/2026 {time}:00\",\"Ready\"\r\n"));
                }
                Ok(ok(&out))
            }
            ["/Create", "/TN", name, rest @ ..] => {
                if Some(*name) == self.hang {
                    return Err(SchedulerError::Timeout {
                        program: "schtasks".into(),
                        ms: 30_000,
                    });
                }
                if Some(*name) == self.deny {
                    return Ok(failed("ERROR: Access is denied.\r\n"));
                }
                assert_eq!(rest.last(), Some(&"/F"));
                let st = rest.iter().position(|a| *a == "/ST").unwrap();
                tasks.insert(name.to_string(), rest[st + 1].to_string());
                Ok(ok("SUCCESS: The scheduled task has successfully been created.\r\n"))
            }
            ["/Delete", "/TN", name, "/F"] => {
                if tasks.remove(*name).is_some() {
                    Ok(ok("SUCCESS\r\n"))
                } else {
                    Ok(failed(
                        "ERROR: The system cannot find the file specified.\r\n",
                    ))
                }
            }
            other => panic!("unexpected schtasks args {other:?}"),
        }
    }
}

#[tokio::test]
async fn task_store_sync_is_idempotent() {
    let fake = Arc::new(FakeTaskStore::default());
    let backend = SchtasksBackend::new(fake.clone());
    let specs = [
        spec("MediaManager_generate_media_list", "05:00"),
        spec("MediaManager_check_windows_filenames", "06:30"),
    ];

    assert!(sync(&backend, &specs).await.is_success());
    assert!(sync(&backend, &specs).await.is_success());

    let tasks = fake.tasks.lock().unwrap().clone();
    assert_eq!(tasks.len(), 2);
    assert_eq!(tasks["MediaManager_check_windows_filenames"], "06:30");
}

#[tokio::test]
async fn task_store_remove_absent_is_ok() {
    let backend = SchtasksBackend::new(Arc::new(FakeTaskStore::default()));
    backend.remove("MediaManager_CompleteCheck").await.unwrap();
}

#[tokio::test]
async fn privilege_and_timeout_failures_are_per_job() {
    let fake = Arc::new(FakeTaskStore {
        deny: Some("MediaManager_a"),
        hang: Some("MediaManager_b"),
        ..FakeTaskStore::default()
    });
    let backend = SchtasksBackend::new(fake.clone());
    let report = sync(
        &backend,
        &[
            spec("MediaManager_a", "01:00"),
            spec("MediaManager_b", "02:00"),
            spec("MediaManager_c", "03:00"),
        ],
    )
    .await;

    assert!(!report.is_success());
    let codes: Vec<_> = report
        .failures()
        .map(|o| (o.name.as_str(), o.result.as_ref().unwrap_err().code()))
        .collect();
    assert_eq!(
        codes,
        [
            ("MediaManager_a", "SCHEDULER_PRIVILEGE"),
            ("MediaManager_b", "SCHEDULER_TIMEOUT"),
        ]
    );
    assert!(fake.tasks.lock().unwrap().contains_key("MediaManager_c"));
}
