//! Demo data seeder for Grantwise development and testing.
//!
//! Writes a snapshot with one grant, its budget, a few expenses, a task and a
//! pending payment request. The snapshot path comes from the first argument,
//! then `GRANTWISE__STORE__SNAPSHOT_PATH`, then `data/grantwise.json`.
//!
//! Usage: cargo run --bin seeder [path]

use std::path::PathBuf;

use chrono::NaiveDate;
use grantwise_core::budget::{ExpenseStatus, NewBudget, NewCategory, NewExpense, NewMiniPool};
use grantwise_core::document::NewTemplate;
use grantwise_core::grant::{GrantStatus, NewActivity, NewAim, NewGrant, NewSubAim, NewTask, WorkStatus};
use grantwise_core::payment::NewPaymentRequest;
use grantwise_shared::types::UserId;
use grantwise_store::{EntityStore, save_snapshot};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

const DEFAULT_SNAPSHOT: &str = "data/grantwise.json";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let path = std::env::args()
        .nth(1)
        .or_else(|| std::env::var("GRANTWISE__STORE__SNAPSHOT_PATH").ok())
        .map_or_else(|| PathBuf::from(DEFAULT_SNAPSHOT), PathBuf::from);

    let mut store = EntityStore::new();

    println!("Seeding grant...");
    let grant = store.add_grant(NewGrant {
        title: "Community Health Outreach".into(),
        funding_agency: "Regional Health Foundation".into(),
        amount: dec!(250000),
        status: GrantStatus::Active,
        start_date: NaiveDate::from_ymd_opt(2025, 1, 1),
        end_date: NaiveDate::from_ymd_opt(2026, 12, 31),
        aims: vec![
            aim("Aim 1", "Screening clinics", dec!(150000), &[("1.1", dec!(90000)), ("1.2", dec!(60000))]),
            aim("Aim 2", "Community education", dec!(100000), &[("2.1", dec!(60000)), ("2.2", dec!(40000))]),
        ],
    })?;
    let grant_id = grant.id;
    let first_aim = grant.aims.first().map(|a| a.id);

    println!("Seeding budget...");
    let budget_id = store
        .add_budget(NewBudget {
            grant_id,
            total_budget: dec!(250000),
            fiscal_year: "2025".into(),
        })?
        .id();
    let tree = store.budget_mut(budget_id)?;
    let clinics = tree.add_category(NewCategory {
        name: "Aim 1 - Clinics".into(),
        allocated: dec!(150000),
        aim_id: first_aim,
    })?;
    let outreach = tree.add_category(NewCategory {
        name: "Aim 2 - Outreach".into(),
        allocated: dec!(100000),
        aim_id: None,
    })?;
    let supplies = tree.add_mini_pool(
        clinics,
        NewMiniPool {
            description: "Medical supplies".into(),
            allocated: dec!(40000),
        },
    )?;
    let travel = tree.add_mini_pool(
        outreach,
        NewMiniPool {
            description: "Travel".into(),
            allocated: dec!(12000),
        },
    )?;

    println!("Seeding expenses...");
    for (mini_pool, description, amount, status) in [
        (supplies, "Test kits", dec!(8200), ExpenseStatus::Spent),
        (supplies, "Gloves and masks", dec!(1450.50), ExpenseStatus::Spent),
        (supplies, "Refrigerator", dec!(3100), ExpenseStatus::Planned),
        (travel, "Mileage Q1", dec!(640), ExpenseStatus::Spent),
        (travel, "Workshop venue", dec!(2500), ExpenseStatus::Planned),
    ] {
        tree.add_expense(mini_pool, expense(description, amount, status))?;
    }

    println!("Seeding task, payment request and template...");
    store.add_task(NewTask {
        title: "Book clinic venues for Q2".into(),
        grant_id: Some(grant_id),
        aim_id: first_aim,
        ..NewTask::default()
    })?;
    store.add_payment_request(NewPaymentRequest {
        grant_id,
        budget_id,
        category_id: Some(outreach),
        mini_pool_id: Some(travel),
        payee: "City Transit".into(),
        description: "Volunteer bus passes".into(),
        amount: dec!(320),
        requested_by: UserId::new(),
    })?;
    store.add_template(NewTemplate {
        name: "Quarterly progress".into(),
        category: "reports".into(),
        body: "During this quarter the project advanced on the following aims:".into(),
    })?;

    save_snapshot(&store, &path).await?;
    println!("Seeding complete! Snapshot written to {}", path.display());
    Ok(())
}

fn aim(number: &str, title: &str, allocation: Decimal, sub_aims: &[(&str, Decimal)]) -> NewAim {
    NewAim {
        number: number.into(),
        title: title.into(),
        status: WorkStatus::InProgress,
        budget_allocation: allocation,
        sub_aims: sub_aims
            .iter()
            .map(|(number, allocation)| NewSubAim {
                number: (*number).into(),
                title: format!("Sub-aim {number}"),
                budget_allocation: *allocation,
                activities: vec![NewActivity {
                    title: "Kick-off".into(),
                    ..NewActivity::default()
                }],
                ..NewSubAim::default()
            })
            .collect(),
        ..NewAim::default()
    }
}

fn expense(description: &str, amount: Decimal, status: ExpenseStatus) -> NewExpense {
    NewExpense {
        description: description.into(),
        amount: Some(amount),
        status,
        vendor: Some("Various".into()),
        ..NewExpense::default()
    }
}
