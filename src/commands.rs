//! Named commands with positional arguments, each gated by a role check
//! before anything is read or written.

use chrono::{DateTime, Utc};

use crate::announce;
use crate::auth::{self, Role};
use crate::certificate::CertificateIssuer;
use crate::clock::CohortClock;
use crate::error::{AppError, AppResult};
use crate::ledger;
use crate::lifecycle;
use crate::models::{AwardKind, Status};
use crate::notify::Notifier;
use crate::report;
use crate::store::Store;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Help,
    Start,
    Register { full_name: String },
    Progress,
    Submit { day: i32 },
    PinToday,
    PinCustom { day: i32 },
    DayNext,
    DaySet { day: i32 },
    Pending { day: i32 },
    Report,
    Mark {
        code: String,
        day: i32,
        score: i32,
        feedback: String,
    },
    Approve { code: String },
    Pause { code: String },
    Resume { code: String },
    Star { code: String, day: i32 },
    Winner { code: String, day: i32 },
    Bonus { code: String },
    PostUpgradeNotice,
    Certify,
    /// Without a code every completed candidate is graduated.
    Graduate { code: Option<String> },
}

fn usage(text: &str) -> AppError {
    AppError::InvalidArgument(format!("Usage: {text}"))
}

fn number(raw: &str, what: &str) -> AppResult<i32> {
    raw.trim()
        .parse()
        .map_err(|_| AppError::InvalidArgument(format!("{what} must be a number")))
}

impl Command {
    /// Parse a command name (with or without a leading `/`) and its arguments.
    pub fn parse(name: &str, args: &[String]) -> AppResult<Self> {
        let name = name.trim().trim_start_matches('/').to_ascii_lowercase();
        let command = match (name.as_str(), args) {
            ("help", _) => Command::Help,
            ("start", _) => Command::Start,
            ("register", []) => return Err(usage("register FIRST LAST")),
            ("register", words) => Command::Register {
                full_name: words.join(" "),
            },
            ("progress", _) => Command::Progress,
            ("submit", [day, ..]) => Command::Submit {
                day: number(day, "Day")?,
            },
            ("submit", []) => return Err(usage("submit DAY_NUMBER and attach your file")),
            ("pin_today", _) => Command::PinToday,
            ("pin_custom", [day, ..]) => Command::PinCustom {
                day: number(day, "Day")?,
            },
            ("pin_custom", []) => return Err(usage("pin_custom DAY_NUMBER (1-12)")),
            ("day_next", _) => Command::DayNext,
            ("day_set", [day, ..]) => Command::DaySet {
                day: number(day, "Day")?,
            },
            ("day_set", []) => return Err(usage("day_set N (1-12)")),
            ("pending", [day, ..]) => Command::Pending {
                day: number(day, "Day")?,
            },
            ("pending", []) => return Err(usage("pending DAY")),
            ("report", _) => Command::Report,
            ("mark", [code, day, score, feedback @ ..]) => Command::Mark {
                code: code.trim().to_string(),
                day: number(day, "DAY")?,
                score: number(score, "SCORE")?,
                feedback: feedback.join(" "),
            },
            ("mark", _) => return Err(usage("mark CODE DAY SCORE [feedback...]")),
            ("approve", [code, ..]) => Command::Approve {
                code: code.trim().to_string(),
            },
            ("approve", []) => return Err(usage("approve CODE")),
            ("pause", [code, ..]) => Command::Pause {
                code: code.trim().to_string(),
            },
            ("pause", []) => return Err(usage("pause CODE")),
            ("resume", [code, ..]) => Command::Resume {
                code: code.trim().to_string(),
            },
            ("resume", []) => return Err(usage("resume CODE")),
            ("star", [code, day, ..]) => Command::Star {
                code: code.trim().to_string(),
                day: number(day, "DAY")?,
            },
            ("star", _) => return Err(usage("star CODE DAY")),
            ("winner", [code, day, ..]) => Command::Winner {
                code: code.trim().to_string(),
                day: number(day, "DAY")?,
            },
            ("winner", _) => return Err(usage("winner CODE DAY")),
            ("bonus", [code, ..]) => Command::Bonus {
                code: code.trim().to_string(),
            },
            ("bonus", []) => return Err(usage("bonus CODE")),
            ("post_upgrade_notice", _) => Command::PostUpgradeNotice,
            ("certify", _) => Command::Certify,
            ("graduate", rest) => Command::Graduate {
                code: rest.first().map(|c| c.trim().to_string()),
            },
            (other, _) => {
                return Err(AppError::InvalidArgument(format!(
                    "unknown command `{other}`, try `help`"
                )))
            }
        };
        Ok(command)
    }

    pub fn required_role(&self) -> Role {
        match self {
            Command::Help
            | Command::Start
            | Command::Register { .. }
            | Command::Progress
            | Command::Submit { .. } => Role::Student,
            Command::PinToday
            | Command::PinCustom { .. }
            | Command::DayNext
            | Command::DaySet { .. }
            | Command::Pending { .. }
            | Command::Report
            | Command::Mark { .. }
            | Command::Approve { .. }
            | Command::Pause { .. }
            | Command::Resume { .. }
            | Command::Star { .. }
            | Command::Winner { .. }
            | Command::Bonus { .. }
            | Command::PostUpgradeNotice => Role::Trainer,
            Command::Certify | Command::Graduate { .. } => Role::Admin,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Caller {
    pub chat_id: i64,
    pub role: Role,
}

/// Collaborators a command runs against.
pub struct Academy<'a> {
    pub store: &'a dyn Store,
    pub notifier: &'a dyn Notifier,
    pub certificates: &'a dyn CertificateIssuer,
    pub clock: CohortClock,
    pub dm_advanced_to_approved: bool,
}

impl Academy<'_> {
    /// Authorize and run one command, returning the reply for the caller.
    pub async fn handle(
        &self,
        caller: Caller,
        command: Command,
        attachment: Option<&str>,
        now: DateTime<Utc>,
    ) -> AppResult<String> {
        auth::authorize(caller.role, command.required_role())?;
        tracing::debug!(chat_id = caller.chat_id, ?command, "handling command");

        let store = self.store;
        let notifier = self.notifier;

        let reply = match command {
            Command::Help => report::help_text(),
            Command::Start => match store.student_by_chat_id(caller.chat_id).await? {
                Some(student) => report::welcome_back(&student),
                None => report::registration_prompt(),
            },
            Command::Register { full_name } => {
                let student = lifecycle::register(store, caller.chat_id, &full_name, now).await?;
                report::registration_confirmed(&student)
            }
            Command::Progress => {
                let (student, summary) = ledger::own_progress(store, caller.chat_id).await?;
                report::progress_report(&student, &summary)
            }
            Command::Submit { day } => {
                ledger::submit(store, notifier, caller.chat_id, day, attachment, now).await?;
                "✅ Submission received. Photex trainers will review and respond.".to_string()
            }
            Command::PinToday => {
                let day = self.clock.current(store).await?;
                let pinned =
                    announce::pin_lesson(store, notifier, day, self.dm_advanced_to_approved).await?;
                format!("📌 Lesson {} pinned.", pinned.lesson.day)
            }
            Command::PinCustom { day } => {
                let pinned =
                    announce::pin_lesson(store, notifier, day, self.dm_advanced_to_approved).await?;
                format!("📌 Lesson {} pinned.", pinned.lesson.day)
            }
            Command::DayNext => {
                let day = self.clock.advance(store).await?;
                format!("✅ Cohort day advanced to {day}.")
            }
            Command::DaySet { day } => {
                let day = self.clock.set_day(store, day).await?;
                format!("✅ Cohort day set to {day}.")
            }
            Command::Pending { day } => {
                let pending = ledger::pending_for(store, day).await?;
                report::pending_report(day, &pending)
            }
            Command::Report => {
                let students = store
                    .active_students(&[Status::Basic, Status::Advanced, Status::Paused])
                    .await?;
                report::class_report(&students)
            }
            Command::Mark {
                code,
                day,
                score,
                feedback,
            } => {
                ledger::grade(store, notifier, &code, day, score, &feedback).await?;
                format!("✅ Marked {code} for Lesson {day}: {score}.")
            }
            Command::Approve { code } => {
                lifecycle::approve(store, notifier, &code).await?;
                format!("🎓 {code} has been approved for Advanced Training.")
            }
            Command::Pause { code } => {
                lifecycle::pause(store, &code).await?;
                format!("⏸️ {code} has been paused.")
            }
            Command::Resume { code } => {
                if lifecycle::resume(store, &code).await? {
                    format!("▶️ {code} has been resumed (Basics).")
                } else {
                    format!("{code} is not paused; nothing changed.")
                }
            }
            Command::Star { code, day } => {
                ledger::award(store, notifier, &code, AwardKind::Star, day, now).await?;
                format!("🌟 Awarded Student of the Day: {code} for Lesson {day}.")
            }
            Command::Winner { code, day } => {
                ledger::award(store, notifier, &code, AwardKind::Winner, day, now).await?;
                format!("🏆 {code} recorded as winner for Lesson {day}.")
            }
            Command::Bonus { code } => {
                ledger::award(store, notifier, &code, AwardKind::Bonus, 0, now).await?;
                format!("🎁 Bonus sent to {code}.")
            }
            Command::PostUpgradeNotice => {
                if announce::post_upgrade_notice(notifier).await {
                    "📣 Upgrade notice posted.".to_string()
                } else {
                    "Upgrade notice could not be delivered to the group.".to_string()
                }
            }
            Command::Certify => {
                let issued = announce::certify_completed(store, notifier, self.certificates).await?;
                format!("Certificates issued: {issued}")
            }
            Command::Graduate { code: Some(code) } => {
                let graduation = lifecycle::mark_graduated(store, notifier, &code).await?;
                if graduation.removed_from_group {
                    format!("🎓 {code} graduated and was removed from the group.")
                } else {
                    format!("🎓 {code} graduated; removal from the group failed.")
                }
            }
            Command::Graduate { code: None } => {
                let run = lifecycle::graduate_all(store, notifier).await?;
                format!(
                    "Graduation complete. Graduated: {}. Removed from group: {}",
                    run.graduated, run.removed_from_group
                )
            }
        };
        Ok(reply)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Datelike, Duration, TimeZone};

    use super::*;
    use crate::certificate::testing::StubIssuer;
    use crate::curriculum;
    use crate::error::ErrorKind;
    use crate::notify::testing::RecordingNotifier;
    use crate::store::MemoryStore;

    const STUDENT: i64 = 100;
    const TRAINER: i64 = 200;
    const ADMIN: i64 = 300;

    fn args(raw: &str) -> Vec<String> {
        raw.split_whitespace().map(str::to_string).collect()
    }

    fn caller(chat_id: i64) -> Caller {
        let role = match chat_id {
            TRAINER => Role::Trainer,
            ADMIN => Role::Admin,
            _ => Role::Student,
        };
        Caller { chat_id, role }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 2, 9, 8, 0, 0).unwrap()
    }

    struct Fixture {
        store: MemoryStore,
        notifier: RecordingNotifier,
        issuer: StubIssuer,
    }

    impl Fixture {
        async fn new() -> Self {
            let store = MemoryStore::new();
            store.seed_lessons(&curriculum::lessons()).await.unwrap();
            CohortClock::default().ensure_default(&store).await.unwrap();
            Self {
                store,
                notifier: RecordingNotifier::new(),
                issuer: StubIssuer::default(),
            }
        }

        fn academy(&self) -> Academy<'_> {
            Academy {
                store: &self.store,
                notifier: &self.notifier,
                certificates: &self.issuer,
                clock: CohortClock::default(),
                dm_advanced_to_approved: true,
            }
        }

        async fn run(&self, chat_id: i64, line: &str) -> AppResult<String> {
            self.run_with(chat_id, line, None, now()).await
        }

        async fn run_with(
            &self,
            chat_id: i64,
            line: &str,
            attachment: Option<&str>,
            at: DateTime<Utc>,
        ) -> AppResult<String> {
            let mut words = args(line);
            let name = words.remove(0);
            let command = Command::parse(&name, &words)?;
            self.academy()
                .handle(caller(chat_id), command, attachment, at)
                .await
        }
    }

    #[test]
    fn parses_positional_arguments() {
        assert_eq!(
            Command::parse("/mark", &args("PHX-2026-0001 3 8 clean retouch")).unwrap(),
            Command::Mark {
                code: "PHX-2026-0001".to_string(),
                day: 3,
                score: 8,
                feedback: "clean retouch".to_string(),
            }
        );
        assert_eq!(
            Command::parse("register", &args("Jane Doe")).unwrap(),
            Command::Register {
                full_name: "Jane Doe".to_string()
            }
        );
        assert_eq!(
            Command::parse("graduate", &[]).unwrap(),
            Command::Graduate { code: None }
        );
    }

    #[test]
    fn bad_argument_shapes_are_validation_errors() {
        for (name, raw) in [
            ("submit", "five"),
            ("day_set", "x"),
            ("mark", "PHX-2026-0001 3"),
            ("mark", "PHX-2026-0001 three 8"),
            ("approve", ""),
            ("teleport", ""),
        ] {
            let err = Command::parse(name, &args(raw)).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Validation, "{name} {raw}");
        }
    }

    #[test]
    fn roles_follow_command_groups() {
        assert_eq!(Command::Progress.required_role(), Role::Student);
        assert_eq!(
            Command::Approve {
                code: String::new()
            }
            .required_role(),
            Role::Trainer
        );
        assert_eq!(Command::Certify.required_role(), Role::Admin);
    }

    #[tokio::test]
    async fn unauthorized_calls_have_no_side_effect() {
        let fixture = Fixture::new().await;
        fixture.run(STUDENT, "register Jane Doe").await.unwrap();
        let code = fixture
            .store
            .student_by_chat_id(STUDENT)
            .await
            .unwrap()
            .unwrap()
            .code;

        let err = fixture
            .run(STUDENT, &format!("approve {code}"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::PermissionDenied);

        let err = fixture.run(TRAINER, "graduate").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::PermissionDenied);

        let err = fixture.run(STUDENT, "day_set 5").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::PermissionDenied);

        let student = fixture.store.student_by_code(&code).await.unwrap().unwrap();
        assert_eq!(student.status, Status::Basic);
        assert_eq!(CohortClock::default().current(&fixture.store).await.unwrap(), 1);
        assert!(fixture.notifier.group_messages().is_empty());
    }

    #[tokio::test]
    async fn day_set_out_of_range_keeps_day() {
        let fixture = Fixture::new().await;
        fixture.run(TRAINER, "day_set 4").await.unwrap();

        let err = fixture.run(TRAINER, "day_set 15").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(CohortClock::default().current(&fixture.store).await.unwrap(), 4);
    }

    #[tokio::test]
    async fn pin_today_follows_cohort_clock() {
        let fixture = Fixture::new().await;
        fixture.run(TRAINER, "day_set 3").await.unwrap();
        assert_eq!(fixture.run(TRAINER, "day_next").await.unwrap(), "✅ Cohort day advanced to 4.");

        let reply = fixture.run(TRAINER, "pin_today").await.unwrap();
        assert_eq!(reply, "📌 Lesson 4 pinned.");
        assert!(fixture.notifier.group_messages()[0].contains("Lesson 4"));
    }

    #[tokio::test]
    async fn start_reports_registration_state() {
        let fixture = Fixture::new().await;
        let prompt = fixture.run(STUDENT, "start").await.unwrap();
        assert!(prompt.contains("FULL NAME"));

        fixture.run(STUDENT, "register Jane Doe").await.unwrap();
        let back = fixture.run(STUDENT, "/start").await.unwrap();
        assert!(back.contains("Welcome back, Jane Doe!"));
        assert!(back.contains("Status: BASIC."));
    }

    #[tokio::test]
    async fn full_advanced_track_to_graduation() {
        let fixture = Fixture::new().await;
        let reply = fixture.run(STUDENT, "register Jane Doe").await.unwrap();
        let year = now().year();
        let code = format!("PHX-{year}-0001");
        assert!(reply.contains(&code));

        fixture.run(TRAINER, &format!("approve {code}")).await.unwrap();
        let student = fixture.store.student_by_code(&code).await.unwrap().unwrap();
        assert_eq!(student.status, Status::Advanced);

        for day in 5..=12 {
            let at = now() + Duration::days(i64::from(day));
            fixture
                .run_with(STUDENT, &format!("submit {day}"), Some("file-id"), at)
                .await
                .unwrap();
        }
        assert!(lifecycle::completed_advanced(&fixture.store, &code).await.unwrap());

        let reply = fixture.run(ADMIN, "certify").await.unwrap();
        assert_eq!(reply, "Certificates issued: 1");

        let reply = fixture.run(ADMIN, &format!("graduate {code}")).await.unwrap();
        assert!(reply.contains("graduated"));

        let student = fixture.store.student_by_code(&code).await.unwrap().unwrap();
        assert_eq!(student.status, Status::Graduated);
        assert!(student.graduated);

        for day in [1, 5, 12] {
            assert_eq!(
                fixture.run(TRAINER, &format!("pending {day}")).await.unwrap(),
                "✅ Everyone submitted!"
            );
        }
        assert_eq!(fixture.run(TRAINER, "report").await.unwrap(), "No students yet.");
    }

    #[tokio::test]
    async fn mark_replies_and_progress_reflects_grade() {
        let fixture = Fixture::new().await;
        fixture.run(STUDENT, "register Jane Doe").await.unwrap();
        let code = format!("PHX-{}-0001", now().year());
        fixture
            .run_with(STUDENT, "submit 1", Some("intro.jpg"), now())
            .await
            .unwrap();

        let reply = fixture
            .run(TRAINER, &format!("mark {code} 1 9 great start"))
            .await
            .unwrap();
        assert_eq!(reply, format!("✅ Marked {code} for Lesson 1: 9."));

        let progress = fixture.run(STUDENT, "progress").await.unwrap();
        assert!(progress.contains("Submissions: 1"));
        assert!(progress.contains("Average Score: 9.0"));
    }

    #[tokio::test]
    async fn resume_reply_distinguishes_no_op() {
        let fixture = Fixture::new().await;
        fixture.run(STUDENT, "register Jane Doe").await.unwrap();
        let code = format!("PHX-{}-0001", now().year());

        let reply = fixture.run(TRAINER, &format!("resume {code}")).await.unwrap();
        assert!(reply.contains("not paused"));

        fixture.run(TRAINER, &format!("pause {code}")).await.unwrap();
        let reply = fixture.run(TRAINER, &format!("resume {code}")).await.unwrap();
        assert!(reply.contains("resumed"));
    }
}
