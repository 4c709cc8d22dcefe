//! HTML rendering of the document.
//!
//! Every user-supplied string goes through [`escape_html`]. Coordinates that
//! arrived as JSON numbers are printed as-is.

use std::fmt::Write;

use crate::maps::widget::MapView;
use crate::models::user::{Coordinate, UserRecord};
use crate::render::escape::{escape_html, escape_opt};
use crate::stores::document::{Card, Content, Document, MapState};
use crate::stores::map_registry::MapRegistry;

const STYLE: &str = r#"
body { font-family: sans-serif; background: #f4f6f8; margin: 0; padding: 24px; }
h1 { text-align: center; }
#loading { text-align: center; padding: 40px; }
#users-container { display: grid; grid-template-columns: repeat(auto-fill, minmax(320px, 1fr)); gap: 16px; }
.user-card { background: #fff; border-radius: 8px; padding: 16px; box-shadow: 0 1px 3px rgba(0,0,0,.15); }
.user-card.expanded { grid-column: 1 / -1; }
.user-card .toggle { border: 0; background: none; padding: 0; text-align: left; cursor: pointer; width: 100%; }
.map-info, .user-map { display: none; }
.user-card.expanded .map-info, .user-card.expanded .user-map { display: block; }
.map-loading { display: none; }
.map-loading.visible { display: block; }
.user-map { position: relative; overflow: hidden; margin-top: 12px; }
.user-map img.tile { position: absolute; width: 256px; height: 256px; }
.user-map .marker { position: absolute; transform: translate(-50%, -100%); }
.user-map .popup { position: absolute; background: #fff; padding: 4px 8px; border-radius: 4px; transform: translate(-50%, -100%); white-space: nowrap; }
.user-map .attribution { position: absolute; right: 0; bottom: 0; background: rgba(255,255,255,.8); font-size: 11px; padding: 0 4px; }
.error, .map-error { color: #b00020; text-align: center; padding: 16px; }
"#;

/// Render the whole page
pub fn render_page(doc: &Document, maps: &MapRegistry) -> String {
    let mut html = String::with_capacity(8 * 1024);

    html.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n");
    html.push_str("<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n");
    if needs_refresh(doc) {
        html.push_str("<meta http-equiv=\"refresh\" content=\"1\">\n");
    }
    html.push_str("<title>User Directory</title>\n<style>");
    html.push_str(STYLE);
    html.push_str("</style>\n</head>\n<body>\n<h1>User Directory</h1>\n");

    let hidden = if doc.is_loading() { "" } else { " hidden" };
    let _ = writeln!(html, "<div id=\"loading\"{}>Loading users...</div>", hidden);

    html.push_str("<div id=\"users-container\">\n");
    match doc.content() {
        Content::Empty => {}
        Content::Error(message) => render_error_panel(&mut html, message),
        Content::Cards(cards) => {
            for card in cards {
                render_card(&mut html, card, maps.get(card.id()).as_ref());
            }
        }
    }
    html.push_str("</div>\n</body>\n</html>\n");

    html
}

/// Whether the client should poll again: a fetch or a map build is pending
fn needs_refresh(doc: &Document) -> bool {
    doc.is_loading() || doc.cards().iter().any(Card::spinner_visible)
}

fn render_error_panel(html: &mut String, message: &str) {
    let _ = write!(
        html,
        concat!(
            "<div class=\"error\">\n",
            "<h3>Something went wrong</h3>\n",
            "<p>{}</p>\n",
            "<form method=\"post\" action=\"/users/reload\">",
            "<button type=\"submit\">Retry</button></form>\n",
            "</div>\n"
        ),
        escape_html(message)
    );
}

/// Render one card
pub fn render_card(html: &mut String, card: &Card, view: Option<&MapView>) {
    let user = card.user();
    let id = card.id();
    let class = if card.is_expanded() {
        "user-card expanded"
    } else {
        "user-card"
    };

    let _ = writeln!(
        html,
        "<article class=\"{}\" id=\"card-{}\" data-user-id=\"{}\">",
        class, id, id
    );

    let _ = write!(
        html,
        concat!(
            "<form method=\"post\" action=\"/cards/{id}/click\">",
            "<input type=\"hidden\" name=\"origin\" value=\"card\">",
            "<button type=\"submit\" class=\"toggle\">\n",
            "<div class=\"user-info\">\n",
            "<h2>{name}</h2>\n",
            "<p><strong>Username:</strong> {username}</p>\n",
            "<p><strong>Email:</strong> {email}</p>\n",
            "<p><strong>Phone:</strong> {phone}</p>\n",
            "<p><strong>Address:</strong> {street}, {city}</p>\n",
            "<p><strong>Company:</strong> {company}</p>\n",
            "</div>\n",
            "</button></form>\n"
        ),
        id = id,
        name = escape_opt(user.name.as_deref()),
        username = escape_opt(user.username.as_deref()),
        email = escape_opt(user.email.as_deref()),
        phone = escape_opt(user.phone.as_deref()),
        street = escape_opt(user.address.street.as_deref()),
        city = escape_opt(user.address.city.as_deref()),
        company = escape_opt(user.company.name.as_deref()),
    );

    let spinner_class = if card.spinner_visible() {
        "map-loading visible"
    } else {
        "map-loading"
    };
    let _ = write!(
        html,
        concat!(
            "<div class=\"map-info\" id=\"mapinfo-{id}\">\n",
            "<p><strong>Coordinates:</strong> {coords}</p>\n",
            "<div class=\"{spinner_class}\" id=\"{spinner_id}\">",
            "<div class=\"loading-spinner\"></div><p>Loading map...</p></div>\n",
            "</div>\n"
        ),
        id = id,
        coords = coordinates_line(user),
        spinner_class = spinner_class,
        spinner_id = card.spinner_id(),
    );

    let size = card.mount_size();
    let _ = write!(
        html,
        "<div class=\"user-map\" id=\"{}\" style=\"width: {}px; height: {}px\">",
        card.mount_id(),
        size.width,
        size.height
    );
    match card.map_state() {
        MapState::Errored { message } => render_map_error(html, id, message),
        MapState::Ready => {
            if let Some(view) = view {
                render_map(html, view);
            }
        }
        MapState::Absent | MapState::Loading => {}
    }
    html.push_str("</div>\n</article>\n");
}

/// `Lat: …, Lng: …` with text coordinates escaped
pub fn coordinates_line(user: &UserRecord) -> String {
    format!(
        "Lat: {}, Lng: {}",
        coordinate_html(user.address.geo.lat.as_ref()),
        coordinate_html(user.address.geo.lng.as_ref())
    )
}

fn coordinate_html(coordinate: Option<&Coordinate>) -> String {
    match coordinate {
        Some(Coordinate::Number(v)) => v.to_string(),
        Some(Coordinate::Text(text)) => escape_html(text),
        None => "undefined".to_string(),
    }
}

fn render_map_error(html: &mut String, id: u64, message: &str) {
    let _ = write!(
        html,
        concat!(
            "\n<div class=\"map-error\">\n",
            "<h4>Failed to load map</h4>\n",
            "<p>{}</p>\n",
            "<form method=\"post\" action=\"/maps/{}/retry\">",
            "<button type=\"submit\">Retry</button></form>\n",
            "</div>\n"
        ),
        escape_html(message),
        id
    );
}

fn render_map(html: &mut String, view: &MapView) {
    html.push('\n');
    for tile in &view.tiles {
        let _ = writeln!(
            html,
            "<img class=\"tile\" alt=\"\" src=\"{}\" style=\"left: {}px; top: {}px\">",
            tile.url, tile.left, tile.top
        );
    }
    if let Some(marker) = &view.marker {
        let _ = writeln!(
            html,
            "<span class=\"marker\" style=\"left: {}px; top: {}px\">&#128205;</span>",
            marker.left, marker.top
        );
        // Popup text was escaped when the marker was built
        let _ = writeln!(
            html,
            "<div class=\"popup\" style=\"left: {}px; top: {}px\">{}</div>",
            marker.left,
            marker.top - 28,
            marker.popup_html
        );
    }
    let _ = writeln!(
        html,
        "<div class=\"attribution\">{}</div>",
        escape_html(&view.attribution)
    );
}
