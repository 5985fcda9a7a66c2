use auth::Session;
use chrono::Utc;
use media::{MediaItem, MediaStatus, StatusEvent};

pub fn print_session(session: &Session) {
    let claims = session.claims();
    println!("Logged in as {} ({})", session.username(), session.role());
    println!("  subject: {}", claims.subject());
    let remaining = claims.expires_at() - Utc::now();
    if remaining.num_seconds() > 0 {
        println!(
            "  token expires at {} (in {} min)",
            claims.expires_at().to_rfc3339(),
            remaining.num_minutes()
        );
    } else {
        println!("  token expired at {}", claims.expires_at().to_rfc3339());
    }
}

fn status_label(status: MediaStatus) -> &'static str {
    match status {
        MediaStatus::Pending => "PENDING",
        MediaStatus::Processing => "PROCESSING",
        MediaStatus::Safe => "SAFE",
        MediaStatus::Flagged => "FLAGGED",
    }
}

fn format_duration(seconds: Option<f64>) -> String {
    match seconds {
        Some(seconds) if seconds >= 0.0 => {
            let total = seconds.round() as u64;
            format!("{}:{:02}", total / 60, total % 60)
        }
        _ => "-".to_string(),
    }
}

pub fn print_library(items: &[&MediaItem]) {
    if items.is_empty() {
        println!("No videos match.");
        return;
    }

    for item in items {
        println!(
            "{:<10} {}  {}  [{}] by {}",
            status_label(item.status),
            item.id,
            item.title,
            format_duration(item.duration),
            if item.uploaded_by.is_empty() {
                "unknown"
            } else {
                item.uploaded_by.as_str()
            }
        );
    }
    println!("{} video(s)", items.len());
}

pub fn print_change(item: Option<&MediaItem>, event: &StatusEvent) {
    let title = item.map_or("<unknown>", |item| item.title.as_str());
    println!(
        "{} {} -> {}",
        Utc::now().format("%H:%M:%S"),
        title,
        status_label(event.status)
    );
}

pub fn print_refresh(count: usize) {
    println!("{} list refreshed, {} video(s)", Utc::now().format("%H:%M:%S"), count);
}
