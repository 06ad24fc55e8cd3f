use axum::{
    extract::State,
    http::{header, HeaderMap, HeaderValue},
    Extension,
};
use printpdf::{BuiltinFont, Mm, PdfDocument};
use std::io::BufWriter;

use crate::auth::middleware::AuthUser;
use crate::error::AppResult;
use crate::handlers::trends::{self, TrendsReport};
use crate::models::entry::{pain_description, PainEntry};
use crate::AppState;

/// The single page holds about this many series rows; older entries are
/// summarized by the header stats instead of listed.
const MAX_SERIES_ROWS: usize = 28;

/// GET /api/trends/report: single-page PDF snapshot of the trends view.
pub async fn download_report(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
) -> AppResult<(HeaderMap, Vec<u8>)> {
    let entries = sqlx::query_as::<_, PainEntry>(
        r#"
        SELECT * FROM pain_entries
        WHERE user_id = $1
        ORDER BY entry_date ASC
        "#,
    )
    .bind(auth_user.id)
    .fetch_all(&state.db)
    .await?;

    let report = trends::build_report(&entries);
    let bytes = render_pdf(&report)?;

    let mut headers = HeaderMap::new();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/pdf"),
    );
    headers.insert(
        header::CONTENT_DISPOSITION,
        HeaderValue::from_static("attachment; filename=\"pain-report.pdf\""),
    );

    Ok((headers, bytes))
}

/// Lay out the report on one A4 page. Returns the PDF bytes.
fn render_pdf(report: &TrendsReport) -> anyhow::Result<Vec<u8>> {
    let (doc, page1, layer1) = PdfDocument::new("Pain Tracker Report", Mm(210.0), Mm(297.0), "Layer 1");
    let layer = doc.get_page(page1).get_layer(layer1);
    let font = doc
        .add_builtin_font(BuiltinFont::Helvetica)
        .map_err(|e| anyhow::anyhow!("PDF font error: {e}"))?;
    let bold = doc
        .add_builtin_font(BuiltinFont::HelveticaBold)
        .map_err(|e| anyhow::anyhow!("PDF font error: {e}"))?;

    let mut y = Mm(280.0);

    layer.use_text("Pain Tracker Report", 14.0, Mm(20.0), y, &bold);
    y -= Mm(10.0);

    // Summary stats
    layer.use_text("SUMMARY:", 11.0, Mm(20.0), y, &bold);
    y -= Mm(6.0);
    let summary_lines = [
        format!("Average pain level: {:.1}", report.average_pain_level),
        format!("Total entries: {}", report.total_entries),
        format!("Pain trend: {}", trend_label(report)),
    ];
    for line in &summary_lines {
        layer.use_text(line, 9.0, Mm(25.0), y, &font);
        y -= Mm(4.5);
    }
    y -= Mm(4.0);

    // Time series
    if !report.series.is_empty() {
        let shown = report.series.len().min(MAX_SERIES_ROWS);
        let heading = if shown < report.series.len() {
            format!(
                "PAIN LEVEL OVER TIME (last {} of {} entries):",
                shown,
                report.series.len()
            )
        } else {
            "PAIN LEVEL OVER TIME:".to_string()
        };
        layer.use_text(&heading, 11.0, Mm(20.0), y, &bold);
        y -= Mm(6.0);

        for point in &report.series[report.series.len() - shown..] {
            let text = format!(
                "  {}   {}/10   {}",
                point.date,
                point.pain_level,
                pain_description(point.pain_level)
            );
            layer.use_text(&text, 9.0, Mm(25.0), y, &font);
            y -= Mm(4.5);
        }
        y -= Mm(4.0);
    }

    // Symptom ranking
    if !report.top_symptoms.is_empty() {
        layer.use_text("MOST COMMON SYMPTOMS:", 11.0, Mm(20.0), y, &bold);
        y -= Mm(6.0);
        for item in &report.top_symptoms {
            let text = format!("  {} ({} entries)", item.symptom, item.count);
            for line in wrap_text(&text, 80) {
                layer.use_text(&line, 9.0, Mm(25.0), y, &font);
                y -= Mm(4.5);
            }
        }
    }

    if report.series.is_empty() {
        layer.use_text(
            "No data yet. Start tracking your pain levels to see trends here.",
            10.0,
            Mm(20.0),
            y,
            &font,
        );
    }

    let mut buf = BufWriter::new(Vec::new());
    doc.save(&mut buf)
        .map_err(|e| anyhow::anyhow!("PDF save error: {e}"))?;
    buf.into_inner()
        .map_err(|e| anyhow::anyhow!("PDF buffer error: {e}"))
}

fn trend_label(report: &TrendsReport) -> &'static str {
    match report.trend {
        trends::Trend::Increasing => "increasing",
        trends::Trend::Decreasing => "decreasing",
        trends::Trend::Stable => "stable",
    }
}

fn wrap_text(text: &str, max_chars: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        if current.len() + word.len() + 1 > max_chars && !current.is_empty() {
            lines.push(current.clone());
            current.clear();
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
    }
    if !current.is_empty() {
        lines.push(current);
    }
    if lines.is_empty() {
        lines.push(String::new());
    }
    lines
}
