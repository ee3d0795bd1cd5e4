//! # Pages
//!
//! HTML pages are plain files under `templates/`, embedded at compile time.
//!
//! ## Placeholders
//! - `{{key}}`: replaced by the value given for `key`, left untouched when no value is given
//! - `{{username|slice:0:1|upper}}`: the upper-cased first character of `username`, used for avatars
//!
//! Values are inserted verbatim. Anything that came from a user must go through [`escape`]
//! first, list fragments are built with escaped fields by the route handlers.
use chrono::{DateTime, Datelike, FixedOffset, Offset, Timelike, Utc};

const AVATAR_PLACEHOLDER: &str = "{{username|slice:0:1|upper}}";

/// Asia/Jakarta, no daylight saving.
const JAKARTA_OFFSET_SECS: i32 = 7 * 60 * 60;

const MONTHS: [&str; 12] = [
    "Januari",
    "Februari",
    "Maret",
    "April",
    "Mei",
    "Juni",
    "Juli",
    "Agustus",
    "September",
    "Oktober",
    "November",
    "Desember",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    Login,
    Register,
    Dashboard,
    DashboardAdmin,
    RoomTypes,
    AvailableRooms,
    Payments,
    PaymentsAdmin,
    UserList,
    Profile,
    ProfileAdmin,
    ManageRooms,
    BookingForm,
    AccessDenied,
}

impl Page {
    fn source(self) -> &'static str {
        match self {
            Page::Login => include_str!("../templates/login.html"),
            Page::Register => include_str!("../templates/register.html"),
            Page::Dashboard => include_str!("../templates/dashboard.html"),
            Page::DashboardAdmin => include_str!("../templates/dashboardAdmin.html"),
            Page::RoomTypes => include_str!("../templates/TipeKamar.html"),
            Page::AvailableRooms => include_str!("../templates/kamarTersedia.html"),
            Page::Payments => include_str!("../templates/laporanKeuangan.html"),
            Page::PaymentsAdmin => include_str!("../templates/laporanKeuanganAdmin.html"),
            Page::UserList => include_str!("../templates/daftarUser.html"),
            Page::Profile => include_str!("../templates/profile.html"),
            Page::ProfileAdmin => include_str!("../templates/profileAdmin.html"),
            Page::ManageRooms => include_str!("../templates/kelolaKamar.html"),
            Page::BookingForm => include_str!("../templates/Form.html"),
            Page::AccessDenied => include_str!("../templates/accessDenied.html"),
        }
    }
}

/// One pass over the template; inserted values are never scanned for placeholders again.
pub fn render(page: Page, values: &[(&str, &str)]) -> String {
    let source = page.source();
    let mut html = String::with_capacity(source.len());
    let mut rest = source;

    while let Some(start) = rest.find("{{") {
        html.push_str(&rest[..start]);
        let tail = &rest[start..];

        let Some(end) = tail.find("}}") else {
            rest = tail;
            break;
        };
        let placeholder = &tail[..end + 2];
        let key = &placeholder[2..end];

        if placeholder == AVATAR_PLACEHOLDER {
            match lookup(values, "username") {
                Some(username) => html.push_str(&avatar_initial(username)),
                None => html.push_str(placeholder),
            }
        } else {
            html.push_str(lookup(values, key).unwrap_or(placeholder));
        }

        rest = &tail[end + 2..];
    }

    html.push_str(rest);
    html
}

fn lookup<'a>(values: &[(&str, &'a str)], key: &str) -> Option<&'a str> {
    values.iter().find(|(k, _)| *k == key).map(|(_, value)| *value)
}

/// First character of an already escaped username, keeping an entity like `&lt;` whole.
fn avatar_initial(escaped: &str) -> String {
    if escaped.starts_with('&') {
        if let Some(end) = escaped.find(';') {
            return escaped[..=end].to_string();
        }
    }

    escaped.chars().next().map(|c| c.to_uppercase().collect()).unwrap_or_default()
}

pub fn escape(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());

    for c in raw.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            c => escaped.push(c),
        }
    }

    escaped
}

pub fn encode_component(raw: &str) -> String {
    urlencoding::encode(raw).into_owned()
}

/// Rupiah amounts grouped the Indonesian way, `1500000` becomes `1.500.000`.
pub fn format_rupiah(amount: i64) -> String {
    let digits = amount.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3 + 1);

    if amount < 0 {
        grouped.push('-');
    }

    for (i, digit) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(digit);
    }

    grouped
}

fn jakarta(timestamp: DateTime<Utc>) -> DateTime<FixedOffset> {
    let offset = FixedOffset::east_opt(JAKARTA_OFFSET_SECS).unwrap_or_else(|| Utc.fix());
    timestamp.with_timezone(&offset)
}

/// `05 Januari 2026`
pub fn format_date(timestamp: DateTime<Utc>) -> String {
    let local = jakarta(timestamp);

    format!(
        "{:02} {} {}",
        local.day(),
        MONTHS[local.month0() as usize],
        local.year()
    )
}

/// `2026-01-05`, for date inputs.
pub fn format_iso_date(timestamp: DateTime<Utc>) -> String {
    jakarta(timestamp).format("%Y-%m-%d").to_string()
}

/// `14.05.09`, 24-hour clock.
pub fn format_time(timestamp: DateTime<Utc>) -> String {
    let local = jakarta(timestamp);

    format!(
        "{:02}.{:02}.{:02}",
        local.hour(),
        local.minute(),
        local.second()
    )
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn replaces_every_occurrence_and_keeps_unknown_keys() {
        let html = render(Page::Login, &[("error", "<b>oops</b>")]);

        assert!(html.contains("<b>oops</b>"));
        assert!(!html.contains("{{error}}"));

        let untouched = render(Page::Login, &[]);
        assert!(untouched.contains("{{error}}"));
    }

    #[test]
    fn avatar_initial_is_upper_cased() {
        let html = render(Page::Dashboard, &[("username", "budi"), ("role", "user"), ("jumlahTersedia", "2")]);

        assert!(html.contains(">B<"));
        assert!(!html.contains(AVATAR_PLACEHOLDER));
        assert!(html.contains("budi"));
    }

    #[test]
    fn inserted_values_are_not_expanded_again() {
        let html = render(
            Page::RoomTypes,
            &[("username", "{{kamarList}}"), ("kamarList", "<div>CARD</div>"), ("searchQuery", "")],
        );

        assert_eq!(html.matches("CARD").count(), 1);
        assert!(html.contains("{{kamarList}}"));
    }

    #[test]
    fn avatar_keeps_escaped_entities_whole() {
        let username = escape("<budi");
        let html = render(Page::Dashboard, &[("username", username.as_str()), ("role", "user"), ("jumlahTersedia", "0")]);

        assert!(html.contains(">&lt;<"));
        assert_eq!(avatar_initial("&amp;x"), "&amp;");
        assert_eq!(avatar_initial("siti"), "S");
        assert_eq!(avatar_initial(""), "");
    }

    #[test]
    fn escapes_markup() {
        assert_eq!(escape(r#"<a href="x">'&'</a>"#), "&lt;a href=&quot;x&quot;&gt;&#39;&amp;&#39;&lt;/a&gt;");
        assert_eq!(escape("Deluxe AC"), "Deluxe AC");
    }

    #[test]
    fn rupiah_groups_thousands_with_dots() {
        assert_eq!(format_rupiah(0), "0");
        assert_eq!(format_rupiah(950), "950");
        assert_eq!(format_rupiah(1_500), "1.500");
        assert_eq!(format_rupiah(800_000), "800.000");
        assert_eq!(format_rupiah(12_500_000), "12.500.000");
        assert_eq!(format_rupiah(-2_000), "-2.000");
    }

    #[test]
    fn dates_and_times_are_shown_in_jakarta() {
        let paid_at = Utc.with_ymd_and_hms(2026, 1, 4, 19, 5, 9).unwrap();

        assert_eq!(format_date(paid_at), "05 Januari 2026");
        assert_eq!(format_time(paid_at), "02.05.09");
        assert_eq!(format_iso_date(paid_at), "2026-01-05");
    }

    #[test]
    fn components_are_percent_encoded() {
        assert_eq!(encode_component("Kamar VIP & AC"), "Kamar%20VIP%20%26%20AC");
    }
}
