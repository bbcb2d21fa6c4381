use crate::infra::{build_services, Services};
use admissions::applications::{ApplicationStatus, PENDING_APPLICATIONS_PATH};
use admissions::auth::{register, AdminRole, AdminSession, AuthProvider, Department, SignupForm};
use admissions::config::AppConfig;
use admissions::documents::{format_file_size, DocumentKind};
use admissions::error::AppError;
use admissions::store::RemoteStore;
use clap::Args;
use serde_json::{json, Value};

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Narrow the approved-tab listing in the demo output.
    #[arg(long)]
    pub(crate) search: Option<String>,
}

pub(crate) async fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs { search } = args;

    let config = AppConfig::load()?;
    let services = build_services(&config)?;

    println!("Admissions review demo");
    println!("Documents service: {}", config.documents.base_url);

    let ids = seed_applications(&services).await?;
    services.lifecycle.refresh().await?;

    let counts = services.lifecycle.counts();
    println!("\nIntake snapshot");
    println!(
        "- {} applications total | {} pending | {} approved | {} rejected",
        counts.total, counts.pending, counts.approved, counts.rejected
    );
    for application in services.lifecycle.filter(ApplicationStatus::Pending, "") {
        println!(
            "  - {} | {} {} | {}",
            application.id,
            application.record.first_name.as_deref().unwrap_or("?"),
            application.record.last_name.as_deref().unwrap_or("?"),
            application.record.email.as_deref().unwrap_or("no email")
        );
    }

    println!("\nAdmin account setup");
    let mut incomplete = demo_signup_form();
    incomplete.phone = String::new();
    if let Err(err) = register(
        services.provider.as_ref(),
        services.store.as_ref(),
        incomplete,
        None,
    )
    .await
    {
        println!("- Incomplete form rejected: {}", err.user_message());
    }

    let profile = match register(
        services.provider.as_ref(),
        services.store.as_ref(),
        demo_signup_form(),
        None,
    )
    .await
    {
        Ok(profile) => profile,
        Err(err) => {
            println!("- Signup failed: {}", err.user_message());
            return Ok(());
        }
    };
    println!("- Created admin {} ({})", profile.email, profile.uid);

    let user = match services.provider.sign_in("nomsa@school.example", "sekret-9") {
        Ok(user) => user,
        Err(err) => {
            println!("- Sign-in failed: {}", err);
            return Ok(());
        }
    };
    let session = AdminSession::establish(services.store.as_ref(), &user).await;
    let token = services.sessions.open(session.clone());
    println!(
        "- Signed in {} | admin: {} | token {}",
        session.email, session.is_admin, token
    );

    println!("\nReview decisions");
    if let Err(err) = services.lifecycle.approve(&ids[0]).await {
        println!("  Approval failed: {}", err);
        return Ok(());
    }
    println!("- Approved {}", ids[0]);
    if let Err(err) = services.lifecycle.reject(&ids[1]).await {
        println!("  Rejection failed: {}", err);
        return Ok(());
    }
    println!("- Rejected {}", ids[1]);
    services.lifecycle.refresh().await?;

    if let Err(err) = services
        .lifecycle
        .mark_paid(&ids[0], Some(session.uid.clone()))
        .await
    {
        println!("  Payment update failed: {}", err);
        return Ok(());
    }
    println!(
        "- Registration fee recorded for {} by {}",
        ids[0], session.uid
    );
    services.lifecycle.refresh().await?;

    match services
        .lifecycle
        .mark_paid(&ids[0], Some(session.uid.clone()))
        .await
    {
        Err(err) => println!("- Repeat payment refused: {}", err),
        Ok(()) => println!("- Repeat payment unexpectedly accepted"),
    }

    let needle = search.unwrap_or_default();
    if needle.is_empty() {
        println!("\nApproved tab");
    } else {
        println!("\nApproved tab (search: {needle})");
    }
    let listing = services
        .lifecycle
        .filter(ApplicationStatus::Approved, &needle);
    if listing.is_empty() {
        println!("- no matches");
    }
    for application in &listing {
        let paid = if application.record.registration_fee_paid() {
            "fee paid"
        } else {
            "fee outstanding"
        };
        println!(
            "- {} | {} {} | {}",
            application.id,
            application.record.first_name.as_deref().unwrap_or("?"),
            application.record.last_name.as_deref().unwrap_or("?"),
            paid
        );
    }

    println!("\nCleanup");
    if let Err(err) = services.lifecycle.delete(&ids[2]).await {
        println!("  Delete failed: {}", err);
        return Ok(());
    }
    services.lifecycle.refresh().await?;
    let counts = services.lifecycle.counts();
    println!(
        "- Removed {} | {} applications remain ({} pending)",
        ids[2], counts.total, counts.pending
    );

    println!("\nDocument checklist");
    for kind in [
        DocumentKind::StudentIdCopy,
        DocumentKind::PreviousResults,
        DocumentKind::GuardianIdCopy,
    ] {
        println!("- {}", kind.label());
    }
    println!(
        "Upload sizes render as {} | {} | {}",
        format_file_size(18_432),
        format_file_size(1_258_291),
        format_file_size(0)
    );

    Ok(())
}

fn demo_signup_form() -> SignupForm {
    SignupForm {
        first_name: "Nomsa".to_string(),
        last_name: "Mokoena".to_string(),
        email: "nomsa@school.example".to_string(),
        password: "sekret-9".to_string(),
        confirm_password: "sekret-9".to_string(),
        phone: "013 555 0101".to_string(),
        role: AdminRole::AdmissionsOfficer,
        department: Some(Department::Admissions),
    }
}

async fn seed_applications(services: &Services) -> Result<Vec<String>, AppError> {
    let records = demo_intake_records();
    let mut ids = Vec::with_capacity(records.len());
    for record in records {
        let id = services
            .store
            .push(PENDING_APPLICATIONS_PATH, record)
            .await?;
        ids.push(id);
    }
    Ok(ids)
}

/// Payloads shaped the way the public intake form writes them.
fn demo_intake_records() -> Vec<Value> {
    vec![
        json!({
            "firstName": "Thabo",
            "lastName": "Nkosi",
            "email": "thabo@example.com",
            "phone": "013 555 0100",
            "status": "pending",
            "highestGrade": "Grade 9",
            "subjects": "Mathematics, Physical Sciences",
            "schoolProvince": "Mpumalanga",
            "guardian": {
                "firstName": "Grace",
                "lastName": "Nkosi",
                "phone": "013 555 0199"
            }
        }),
        json!({
            "firstName": "Lindiwe",
            "lastName": "Dlamini",
            "email": "lindiwe@example.com",
            "phone": "013 555 0102",
            "status": "pending",
            "highestGrade": "Grade 10",
            "previousSchool": "Ehlazeni Primary",
            "schoolProvince": "Mpumalanga"
        }),
        json!({
            "firstName": "Sipho",
            "lastName": "Mahlangu",
            "email": "sipho@example.com",
            "status": "pending",
            "subjects": "Accounting, Business Studies"
        }),
        json!({
            "firstName": "Naledi",
            "lastName": "Khumalo",
            "email": "naledi@example.com",
            "phone": "013 555 0104",
            "status": "pending",
            "studentCode": "STU-2024-017"
        }),
    ]
}
