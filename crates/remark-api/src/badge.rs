//! SVG badge: a receiver's comments rendered as an embeddable image.
//!
//! Layout is fixed: a title row with the receiver's name, one 35px row per
//! comment and a trailing "Enter your comment..." box, so the height is
//! `BASE_HEIGHT + ROW_HEIGHT * n`.

use axum::{
    extract::{Path, Query, State},
    http::header,
    response::IntoResponse,
};
use serde::Deserialize;

use remark_db::content::escape_html;
use remark_db::models::CommentView;
use remark_types::models::Theme;

use crate::comments::receiver_by_login;
use crate::error::ApiError;
use crate::state::{AppState, run_db};

pub const WIDTH: usize = 540;
pub const MARGIN: usize = 5;
pub const ROW_HEIGHT: usize = 35;
const FIRST_ROW_Y: usize = 40;
const INPUT_BOX_OFFSET: usize = 60;
pub const BASE_HEIGHT: usize = INPUT_BOX_OFFSET + ROW_HEIGHT;

/// One badge row. `content` is the stored, already-escaped comment text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BadgeRow<'a> {
    pub author: &'a str,
    pub content: &'a str,
    pub likes: u32,
    pub dislikes: u32,
    pub owner_acknowledged: bool,
}

impl<'a> From<&'a CommentView> for BadgeRow<'a> {
    fn from(view: &'a CommentView) -> Self {
        Self {
            author: &view.author_name,
            content: &view.content,
            likes: view.counts.likes,
            dislikes: view.counts.dislikes,
            owner_acknowledged: view.owner_acknowledged,
        }
    }
}

pub fn badge_height(rows: usize) -> usize {
    BASE_HEIGHT + rows * ROW_HEIGHT
}

pub fn render_badge(user_name: &str, rows: &[BadgeRow<'_>], theme: Theme) -> String {
    let (bg, fg) = theme.colors();
    let height = badge_height(rows.len());
    let inner_width = WIDTH - 2 * MARGIN;

    let mut lines = Vec::with_capacity(rows.len() * 3 + 6);
    lines.push(format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{WIDTH}" height="{height}">"#
    ));
    lines.push(format!(
        r#"<rect x="0" y="0" width="{WIDTH}" height="{height}" fill="{bg}" stroke="{fg}" rx="5" ry="5"/>"#
    ));
    lines.push(format!(
        r#"<text x="{MARGIN}" y="20" font-family="Arial" font-size="16" fill="{fg}">{}</text>"#,
        escape_html(user_name)
    ));

    for (i, row) in rows.iter().enumerate() {
        let y = FIRST_ROW_Y + i * ROW_HEIGHT;
        let text_y = y + 20;
        let marker = if row.owner_acknowledged { "★ " } else { "" };

        lines.push(format!(
            r#"<rect x="{MARGIN}" y="{y}" width="{inner_width}" height="30" fill="{bg}" stroke="{fg}" rx="5" ry="5"/>"#
        ));
        lines.push(format!(
            r#"<text x="{}" y="{text_y}" font-family="Arial" font-size="14" fill="{fg}">{marker}{}: {}</text>"#,
            MARGIN * 2,
            escape_html(row.author),
            row.content
        ));
        lines.push(format!(
            r#"<text x="{}" y="{text_y}" text-anchor="end" font-family="Arial" font-size="12" fill="{fg}">▲{} ▼{}</text>"#,
            WIDTH - MARGIN * 2,
            row.likes,
            row.dislikes
        ));
    }

    let input_y = INPUT_BOX_OFFSET + rows.len() * ROW_HEIGHT;
    lines.push(format!(
        r#"<rect x="{MARGIN}" y="{input_y}" width="{inner_width}" height="30" fill="{bg}" stroke="{fg}" rx="5" ry="5"/>"#
    ));
    lines.push(format!(
        r#"<text x="{}" y="{}" font-family="Arial" font-size="14" fill="gray">Enter your comment...</text>"#,
        MARGIN * 2,
        input_y + 20
    ));
    lines.push("</svg>".to_string());

    lines.join("\n")
}

#[derive(Debug, Deserialize)]
pub struct BadgeQuery {
    pub theme: Option<String>,
}

/// GET /api/user/{username}/svg?theme=dark|light|transparent
pub async fn get_badge(
    State(state): State<AppState>,
    Path(username): Path<String>,
    Query(query): Query<BadgeQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let theme = Theme::from_query(query.theme.as_deref());

    let (receiver, views) = run_db(&state, move |db| {
        let receiver = receiver_by_login(db, &username)?;
        let views = db.list_comments(receiver.id, None)?;
        Ok::<_, remark_db::StoreError>((receiver, views))
    })
    .await?;

    let rows: Vec<BadgeRow<'_>> = views.iter().map(BadgeRow::from).collect();
    let svg = render_badge(&receiver.display_name, &rows, theme);

    Ok((
        [
            (header::CONTENT_TYPE, "image/svg+xml"),
            (header::CACHE_CONTROL, "no-cache"),
        ],
        svg,
    ))
}
