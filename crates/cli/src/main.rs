//! `rolegate`: administrative command line over the authorization and
//! role-change review entry points.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};

use rolegate_auth::{explain_authorization, Account, Permission, RbacRegistry, Role};
use rolegate_security::{
    generate_compliance_report, AuditEntry, RequestMetadata, RoleChangeReviewer,
};

#[derive(Parser)]
#[command(name = "rolegate")]
#[command(version)]
#[command(about = "Role-based authorization and role-change review", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Explain whether a role holds a permission
    Check {
        /// Role name (e.g. member, administrator)
        role: String,
        /// Permission token (e.g. user:manage)
        permission: String,
    },
    /// Print every role and permission in the catalog
    Roles,
    /// Review a role change described by a JSON file
    Validate {
        /// Path to the review input
        file: PathBuf,
    },
    /// Build a compliance report from a JSON array of audit entries
    Report {
        /// Path to the audit entries
        file: PathBuf,
    },
}

/// JSON input for `rolegate validate`.
#[derive(Debug, Deserialize, Serialize)]
struct ReviewInput {
    admin: Account,
    target: Account,
    new_role: Role,
    #[serde(default)]
    reason: String,
    #[serde(default)]
    metadata: RequestMetadata,
}

fn main() -> Result<()> {
    rolegate_observability::init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Check { role, permission } => check(&role, &permission),
        Commands::Roles => print_json(&RbacRegistry::from_catalog()),
        Commands::Validate { file } => validate(&file),
        Commands::Report { file } => report(&file),
    }
}

fn check(role: &str, permission: &str) -> Result<()> {
    let permission: Permission = permission
        .parse()
        .with_context(|| format!("invalid permission '{permission}'"))?;
    let explanation = explain_authorization(&Role::new(role.to_string()), &permission);
    print_json(&explanation)
}

fn validate(file: &Path) -> Result<()> {
    let input: ReviewInput = read_json(file)?;
    let reviewer = RoleChangeReviewer::from_env().context("invalid ROLEGATE_* configuration")?;

    let review = reviewer.review(
        &input.admin,
        &input.target,
        input.new_role,
        &input.reason,
        input.metadata,
    );
    tracing::info!(
        audit_entry_id = %review.audit_entry.id,
        status = %review.audit_entry.status,
        alert = review.alert.is_some(),
        "role change reviewed"
    );
    print_json(&review)
}

fn report(file: &Path) -> Result<()> {
    let entries: Vec<AuditEntry> = read_json(file)?;
    print_json(&generate_compliance_report(&entries))
}

fn read_json<T: for<'de> Deserialize<'de>>(file: &Path) -> Result<T> {
    let raw = fs::read_to_string(file).with_context(|| format!("reading {}", file.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("parsing {}", file.display()))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
