// refdq-core/src/application/session.rs

use chrono::Utc;
use tracing::{info, instrument, warn};

use crate::application::checks::{bind_checks, relation_under_test, run_checks};
use crate::application::impact::assess_impact;
use crate::application::ports::TemplateEngine;
use crate::application::staging::{reconcile_schema, stage_upload};
use crate::application::type_check::check_types;
use crate::application::action;
use crate::application::write::apply_write;
use crate::domain::impact::Impact;
use crate::domain::project::Dialect;
use crate::domain::session::{
    BlockReason, CheckReport, SchemaReport, SessionLog, SessionReport, SessionState, SessionStatus,
    StageRecord, StagingReport, TypeReport,
};
use crate::domain::target::{CheckRegistry, Target};
use crate::domain::upload::{StagedDataset, UploadMode};
use crate::error::RefdqError;
use crate::ports::connector::Connector;

/// Collaborators shared by every stage of a session.
#[derive(Clone, Copy)]
pub struct SessionContext<'a> {
    pub connector: &'a dyn Connector,
    pub renderer: &'a dyn TemplateEngine,
    pub registry: &'a CheckRegistry,
    pub temp_schema: &'a str,
    pub dialect: Dialect,
}

/// One upload against one target, from staging to write.
///
/// Each stage appends its result to the log and either advances the state or
/// blocks it. Stages called out of order fail with `StageOutOfOrder`.
pub struct ValidationSession<'a> {
    ctx: SessionContext<'a>,
    target: Target,
    mode: UploadMode,
    log: SessionLog,
}

impl<'a> ValidationSession<'a> {
    /// Writes the upload to staging. This is the only entry point.
    #[instrument(skip_all, fields(target = %target.name, mode = %mode))]
    pub async fn stage(
        ctx: SessionContext<'a>,
        target: Target,
        mode: UploadMode,
        data: &StagedDataset,
    ) -> Result<Self, RefdqError> {
        let staging = stage_upload(ctx.connector, &target, ctx.temp_schema, data).await?;
        Ok(Self {
            ctx,
            target,
            mode,
            log: SessionLog::start(staging),
        })
    }

    pub async fn check_schema(&mut self, ignore_schema_errors: bool) -> Result<SessionStatus, RefdqError> {
        self.log.ensure_can_enter(SessionState::SchemaChecked)?;
        let (report, blocked) = reconcile_schema(self.staging()?, &self.target.primary_key, ignore_schema_errors);
        Ok(self.record(SessionState::SchemaChecked, StageRecord::SchemaChecked(report), blocked))
    }

    pub async fn check_types(&mut self) -> Result<SessionStatus, RefdqError> {
        self.log.ensure_can_enter(SessionState::TypeChecked)?;
        let report = check_types(self.ctx.connector, self.ctx.renderer, self.staging()?, &self.target.primary_key).await?;
        let blocked = (!report.violations.is_empty()).then_some(BlockReason::TypeMismatch);
        Ok(self.record(SessionState::TypeChecked, StageRecord::TypeChecked(report), blocked))
    }

    pub async fn assess_impact(&mut self) -> Result<SessionStatus, RefdqError> {
        self.log.ensure_can_enter(SessionState::ImpactAssessed)?;
        let impact = assess_impact(
            self.ctx.connector,
            self.ctx.renderer,
            self.mode,
            self.staging()?,
            &self.target.primary_key,
        )
        .await?;
        let blocked = (!impact.has_changes()).then_some(BlockReason::NoChanges);
        Ok(self.record(SessionState::ImpactAssessed, StageRecord::ImpactAssessed(impact), blocked))
    }

    pub async fn run_checks(&mut self) -> Result<SessionStatus, RefdqError> {
        self.log.ensure_can_enter(SessionState::ChecksRun)?;
        let relation = relation_under_test(self.ctx.renderer, self.mode, self.staging()?, &self.target.primary_key)?;
        let checks = bind_checks(&self.target, self.ctx.registry, &relation)?;
        let report = run_checks(self.ctx.connector, checks).await?;

        let all_passed = report.all_passed;
        let blocked = (!all_passed).then_some(BlockReason::ChecksFailed);
        let status = self.record(SessionState::ChecksRun, StageRecord::ChecksRun(report), blocked);
        if all_passed {
            self.log.promote(SessionState::ReadyToWrite);
            return Ok(self.log.status());
        }
        Ok(status)
    }

    /// Schema check through checks, stopping at the first blocked stage.
    pub async fn run(&mut self, ignore_schema_errors: bool) -> Result<SessionStatus, RefdqError> {
        if self.check_schema(ignore_schema_errors).await?.is_blocked() {
            return Ok(self.status());
        }
        if self.check_types().await?.is_blocked() {
            return Ok(self.status());
        }
        if self.assess_impact().await?.is_blocked() {
            return Ok(self.status());
        }
        self.run_checks().await
    }

    /// Applies the upload. Only reachable once every check has passed.
    pub async fn write(&mut self) -> Result<SessionStatus, RefdqError> {
        self.log.ensure_can_enter(SessionState::Written)?;
        let report = apply_write(
            self.ctx.connector,
            self.ctx.renderer,
            self.ctx.dialect,
            self.mode,
            self.staging()?,
            &self.target.primary_key,
        )
        .await?;
        Ok(self.record(SessionState::Written, StageRecord::Written(report), None))
    }

    /// Runs the post-write action when its trigger allows it. Returns whether
    /// it ran.
    pub async fn run_action(&mut self, opted_in: bool) -> Result<bool, RefdqError> {
        self.log.ensure_can_enter(SessionState::ActionRun)?;
        let Some(post_write) = self.target.action.clone() else {
            return Ok(false);
        };
        if !post_write.should_run(opted_in) {
            info!("Optional action '{}' skipped", post_write.name);
            return Ok(false);
        }
        let report = action::run_action(self.ctx.connector, &self.target, &post_write).await?;
        self.record(SessionState::ActionRun, StageRecord::ActionRun(report), None);
        Ok(true)
    }

    fn record(&mut self, state: SessionState, record: StageRecord, blocked: Option<BlockReason>) -> SessionStatus {
        if let Some(reason) = blocked {
            warn!("⛔ Session blocked at '{}': {}", state, reason);
        } else {
            info!("➡️  Session {}", state);
        }
        self.log.append(state, record, blocked);
        self.log.status()
    }

    fn staging(&self) -> Result<&StagingReport, RefdqError> {
        self.log
            .staging()
            .ok_or_else(|| RefdqError::InternalError("Session has no staging record".into()))
    }

    // --- ACCESSORS ---

    pub fn status(&self) -> SessionStatus {
        self.log.status()
    }

    pub fn target(&self) -> &Target {
        &self.target
    }

    pub fn mode(&self) -> UploadMode {
        self.mode
    }

    pub fn log(&self) -> &SessionLog {
        &self.log
    }

    pub fn staging_report(&self) -> Option<&StagingReport> {
        self.log.staging()
    }

    /// Target columns missing from the upload, once the schema stage ran.
    pub fn schema_diff(&self) -> Option<&[String]> {
        self.log.schema().map(|s| s.missing_columns.as_slice())
    }

    pub fn schema_report(&self) -> Option<&SchemaReport> {
        self.log.schema()
    }

    pub fn type_report(&self) -> Option<&TypeReport> {
        self.log.types()
    }

    pub fn impact(&self) -> Option<&Impact> {
        self.log.impact()
    }

    pub fn check_report(&self) -> Option<&CheckReport> {
        self.log.checks()
    }

    /// `None` until the checks stage has run.
    pub fn all_checks_passed(&self) -> Option<bool> {
        self.log.checks().map(|c| c.all_passed)
    }

    pub fn is_ready_to_write(&self) -> bool {
        self.status() == SessionStatus::Active { state: SessionState::ReadyToWrite }
    }

    pub fn report(&self) -> SessionReport {
        SessionReport {
            target: self.target.name.clone(),
            target_table: self.target.target_table.clone(),
            mode: self.mode,
            generated_at: Utc::now(),
            log: self.log.clone(),
        }
    }
}
