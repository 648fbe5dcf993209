//! Command handlers. Auth-rejected calls come back as `None` and print a
//! logged-out notice instead of an error; everything else propagates for
//! `main` to display.

use std::str::FromStr;
use std::time::Duration;

use crate::client::http::ApiClient;
use crate::client::types::{Credentials, Group, NewGroup, NewUser, User};
use crate::error::SplitmateError;
use crate::reconcile;
use crate::refresh::GroupFeed;
use crate::session::SessionGuard;
use crate::store::{CredentialStore, Theme};

fn print_session_expired() {
    println!("Session expired. Please log in again.");
}

pub async fn login(api: &ApiClient, login: String, password: String) -> Result<(), SplitmateError> {
    let user = api.login(&Credentials { login, password }).await?;
    match user {
        Some(u) => println!("Logged in as {} (id {})", u.name, u.id),
        None => println!("Logged in."),
    }
    Ok(())
}

pub async fn signup(
    api: &ApiClient,
    name: String,
    email: String,
    password: String,
    phone: Option<String>,
) -> Result<(), SplitmateError> {
    let user = api
        .signup(&NewUser {
            name,
            email,
            phone,
            password,
        })
        .await?;
    match user {
        Some(u) => println!("Account created. Logged in as {} (id {})", u.name, u.id),
        None => println!("Account created."),
    }
    Ok(())
}

pub async fn logout(api: &ApiClient) -> Result<(), SplitmateError> {
    api.logout().await;
    println!("Logged out.");
    Ok(())
}

pub async fn whoami(api: &ApiClient) -> Result<(), SplitmateError> {
    match api.me().await? {
        Some(user) => {
            println!("{} (id {})", user.name, user.id);
            if let Some(email) = user.email {
                println!("email: {}", email);
            }
        }
        None => print_session_expired(),
    }
    Ok(())
}

pub async fn session(api: &ApiClient, probe_timeout: Duration) -> Result<(), SplitmateError> {
    let guard = SessionGuard::new(api.clone());
    if guard.validate(probe_timeout).await {
        println!("Session is valid.");
    } else {
        println!("Session is invalid.");
    }
    Ok(())
}

pub async fn dashboard(api: &ApiClient) -> Result<(), SplitmateError> {
    let Some(summary) = api.dashboard().await? else {
        print_session_expired();
        return Ok(());
    };
    println!("Owed to you: {}", summary.total_owed_to_me);
    println!("You owe:     {}", summary.total_i_owe);
    if !summary.outstanding_balances.is_empty() {
        println!("\nOutstanding:");
        for balance in &summary.outstanding_balances {
            if balance.owes_you > rust_decimal::Decimal::ZERO {
                println!("  {} owes you {}", balance.user.name, balance.owes_you);
            } else {
                println!("  you owe {} {}", balance.user.name, balance.you_owe);
            }
        }
    }
    if !summary.recent_expenses.is_empty() {
        println!("\nRecent expenses:");
        for expense in &summary.recent_expenses {
            println!("  {} — {}", expense.description, expense.amount);
        }
    }
    Ok(())
}

pub async fn groups_list(api: &ApiClient) -> Result<(), SplitmateError> {
    let Some(groups) = api.groups().await? else {
        print_session_expired();
        return Ok(());
    };
    if groups.is_empty() {
        println!("No groups yet.");
    }
    for group in groups {
        println!("{:>6}  {}", group.id, group.name);
    }
    Ok(())
}

pub async fn group_show(api: &ApiClient, id: i64) -> Result<(), SplitmateError> {
    let Some(me) = api.me().await? else {
        print_session_expired();
        return Ok(());
    };
    let feed = GroupFeed::new(api.clone(), id);
    let Some(group) = feed.refresh().await? else {
        print_session_expired();
        return Ok(());
    };
    print_group(&me, &group);
    Ok(())
}

pub async fn group_create(
    api: &ApiClient,
    name: String,
    description: Option<String>,
    members: Vec<i64>,
) -> Result<(), SplitmateError> {
    let Some(group) = api
        .create_group(&NewGroup {
            name,
            description,
            member_ids: members,
        })
        .await?
    else {
        print_session_expired();
        return Ok(());
    };
    println!("Created group '{}' (id {})", group.name, group.id);
    Ok(())
}

pub async fn settle(
    api: &ApiClient,
    group_id: i64,
    member_id: i64,
    amount: String,
    notes: Option<String>,
) -> Result<(), SplitmateError> {
    // Identity is resolved fresh, never assumed cached
    let Some(me) = api.me().await? else {
        print_session_expired();
        return Ok(());
    };
    let feed = GroupFeed::new(api.clone(), group_id);
    let Some(group) = feed.refresh().await? else {
        print_session_expired();
        return Ok(());
    };
    let Some(balance) = group
        .member_balances
        .iter()
        .find(|b| b.user.id == member_id)
    else {
        return Err(SplitmateError::Validation(format!(
            "No balance entry for member {} in group {}",
            member_id, group_id
        )));
    };

    let settlement = reconcile::prepare_settlement(balance, &amount, &me, notes.as_deref())
        .map_err(|e| SplitmateError::Validation(e.to_string()))?;

    let Some(_) = api.create_settlement(group_id, &settlement).await? else {
        print_session_expired();
        return Ok(());
    };
    println!(
        "Settled {} between {} and {}.",
        settlement.amount, settlement.payer_id, settlement.payee_id
    );

    // The server's recomputed balances are authoritative
    if let Some(refreshed) = feed.refresh().await? {
        println!();
        print_group(&me, &refreshed);
    }
    Ok(())
}

pub fn theme_get(store: &CredentialStore) -> Result<(), SplitmateError> {
    match store.theme()? {
        Some(theme) => println!("{}", theme),
        None => println!("system (default)"),
    }
    Ok(())
}

pub fn theme_set(store: &CredentialStore, value: &str) -> Result<(), SplitmateError> {
    let theme = Theme::from_str(value)?;
    store.set_theme(theme)?;
    println!("Theme set to {}", theme);
    Ok(())
}

fn print_group(me: &User, group: &Group) {
    println!("{} (id {})", group.name, group.id);
    if let Some(description) = &group.description {
        println!("{}", description);
    }
    let parts = reconcile::partition(me.id, &group.member_balances);
    if !parts.owed_to_user.is_empty() {
        println!("\nOwes you:");
        for b in &parts.owed_to_user {
            println!("  {} — {}", b.user.name, b.owes_you);
        }
    }
    if !parts.user_owes.is_empty() {
        println!("\nYou owe:");
        for b in &parts.user_owes {
            println!("  {} — {}", b.user.name, b.you_owe);
        }
    }
    if !parts.settled.is_empty() {
        println!("\nSettled up:");
        for b in &parts.settled {
            println!("  {}", b.user.name);
        }
    }
    if !group.recent_expenses.is_empty() {
        println!("\nRecent expenses:");
        for expense in &group.recent_expenses {
            match &expense.paid_by {
                Some(payer) => println!(
                    "  {} — {} (paid by {})",
                    expense.description, expense.amount, payer.name
                ),
                None => println!("  {} — {}", expense.description, expense.amount),
            }
        }
    }
}
