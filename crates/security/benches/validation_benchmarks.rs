use criterion::{black_box, criterion_group, criterion_main, Criterion};

use rolegate_auth::{Account, Role};
use rolegate_core::UserId;
use rolegate_security::{
    generate_compliance_report, RequestMetadata, RoleChangeRequest, RoleChangeReviewer,
    RoleChangeValidator,
};

fn fixtures() -> (Account, Account, RequestMetadata) {
    let admin = Account::new(UserId::from_u128(1), "root@example.com", Role::ADMINISTRATOR).unwrap();
    let target = Account::new(UserId::from_u128(2), "dev@example.com", Role::MEMBER).unwrap();
    let metadata = RequestMetadata {
        ip_address: Some("192.0.2.10".to_string()),
        user_agent: Some("Mozilla/5.0".to_string()),
        origin: Some("admin_ui".to_string()),
        session_id: None,
    };
    (admin, target, metadata)
}

fn bench_validate(c: &mut Criterion) {
    let (admin, target, metadata) = fixtures();
    let validator = RoleChangeValidator::default();
    let request = RoleChangeRequest::new(
        &admin,
        &target,
        Role::ADMINISTRATOR,
        "Urgent admin coverage for account management",
        metadata,
    );

    c.bench_function("validate_role_change/escalation", |b| {
        b.iter(|| validator.validate(black_box(&request)))
    });
}

fn bench_report(c: &mut Criterion) {
    let (admin, target, metadata) = fixtures();
    let reviewer = RoleChangeReviewer::default();
    let entries: Vec<_> = (0..1_000)
        .map(|i| {
            let role = if i % 2 == 0 { Role::ADMINISTRATOR } else { Role::MEMBER };
            reviewer
                .review(&admin, &target, role, "Quarterly access review", metadata.clone())
                .audit_entry
        })
        .collect();

    c.bench_function("generate_compliance_report/1000", |b| {
        b.iter(|| generate_compliance_report(black_box(&entries)))
    });
}

criterion_group!(benches, bench_validate, bench_report);
criterion_main!(benches);
