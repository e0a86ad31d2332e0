/// Admin home settings endpoints
use crate::{
    auth::AdminAuthContext,
    blob_store::PendingFile,
    context::AppContext,
    error::{SiteError, SiteResult},
    settings::{
        layout::{parse_layout, parse_url_list},
        HomeSettings, HomeSettingsAction, HomeSettingsSubmission, ImageSubmission,
    },
};
use axum::{
    extract::{multipart::Field, Multipart, State},
    routing::get,
    Json, Router,
};
use serde::Serialize;

/// Build admin settings routes
pub fn routes() -> Router<AppContext> {
    Router::new().route(
        "/admin/api/settings/home",
        get(get_home_settings).post(update_home_settings),
    )
}

#[derive(Debug, Serialize)]
struct HomeSettingsResponse {
    settings: Option<HomeSettings>,
}

/// Current home settings for the editor
async fn get_home_settings(
    State(ctx): State<AppContext>,
    _auth: AdminAuthContext,
) -> SiteResult<Json<HomeSettingsResponse>> {
    let settings = ctx.home_settings.admin_view().await?;
    Ok(Json(HomeSettingsResponse { settings }))
}

/// Save the home settings form
///
/// Accepts multipart form data: text fields, `image_layout` (JSON array) or
/// the older `current_images` (JSON array), and `new_images` file parts in
/// placeholder order.
async fn update_home_settings(
    State(ctx): State<AppContext>,
    auth: AdminAuthContext,
    multipart: Multipart,
) -> SiteResult<Json<HomeSettings>> {
    let form = SettingsForm::read(multipart).await?;
    let submission = form.into_submission()?;

    tracing::info!(
        "{} saving home settings with {} new images",
        auth.subject,
        submission.files.len()
    );

    let settings = ctx.home_settings.update_home_settings(submission).await?;
    Ok(Json(settings))
}

/// Raw multipart fields of the settings form
#[derive(Debug, Default)]
struct SettingsForm {
    hero_headline: Option<String>,
    hero_subheadline: Option<String>,
    show_products_section: Option<String>,
    expected_version: Option<String>,
    image_layout: Option<String>,
    current_images: Option<String>,
    new_images: Vec<PendingFile>,
}

impl SettingsForm {
    async fn read(mut multipart: Multipart) -> SiteResult<Self> {
        let mut form = SettingsForm::default();

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| SiteError::Validation(e.to_string()))?
        {
            let name = field.name().unwrap_or_default().to_string();

            match name.as_str() {
                "hero_headline" => form.hero_headline = Some(read_text(field).await?),
                "hero_subheadline" => form.hero_subheadline = Some(read_text(field).await?),
                "show_products_section" => form.show_products_section = Some(read_text(field).await?),
                "expected_version" => form.expected_version = Some(read_text(field).await?),
                "image_layout" => form.image_layout = Some(read_text(field).await?),
                "current_images" => form.current_images = Some(read_text(field).await?),
                "new_images" => {
                    let file_name = field.file_name().unwrap_or_default().to_string();
                    let content_type = field
                        .content_type()
                        .unwrap_or("application/octet-stream")
                        .to_string();
                    let data = field
                        .bytes()
                        .await
                        .map_err(|e| SiteError::Validation(e.to_string()))?;

                    // Browsers send an empty part when no file was chosen
                    if file_name.is_empty() && data.is_empty() {
                        continue;
                    }

                    form.new_images.push(PendingFile::new(file_name, content_type, data.to_vec()));
                }
                other => tracing::debug!("Ignoring unknown form field {:?}", other),
            }
        }

        Ok(form)
    }

    fn into_submission(self) -> SiteResult<HomeSettingsSubmission> {
        let images = match (self.image_layout, self.current_images) {
            (Some(layout), _) => ImageSubmission::Layout(parse_layout(&layout)?),
            (None, Some(current)) => ImageSubmission::Appended(parse_url_list(&current)?),
            (None, None) => ImageSubmission::Appended(Vec::new()),
        };

        let show_products_section = self
            .show_products_section
            .as_deref()
            .map(parse_bool)
            .transpose()?;

        let expected_version = self
            .expected_version
            .as_deref()
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(|v| {
                v.parse::<i64>()
                    .map_err(|_| SiteError::Validation(format!("Invalid expected_version: {}", v)))
            })
            .transpose()?;

        Ok(HomeSettingsSubmission {
            hero_headline: self.hero_headline.unwrap_or_default(),
            hero_subheadline: self.hero_subheadline.unwrap_or_default(),
            show_products_section,
            expected_version,
            images,
            files: self.new_images,
        })
    }
}

async fn read_text(field: Field<'_>) -> SiteResult<String> {
    field
        .text()
        .await
        .map_err(|e| SiteError::Validation(e.to_string()))
}

/// Parse an HTML form boolean
fn parse_bool(value: &str) -> SiteResult<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "on" | "1" | "yes" => Ok(true),
        "false" | "off" | "0" | "no" | "" => Ok(false),
        other => Err(SiteError::Validation(format!("Invalid boolean: {}", other))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::LayoutEntry;

    #[test]
    fn test_parse_bool() {
        assert!(parse_bool("on").unwrap());
        assert!(parse_bool("TRUE").unwrap());
        assert!(!parse_bool("").unwrap());
        assert!(!parse_bool("false").unwrap());
        assert!(parse_bool("maybe").is_err());
    }

    #[test]
    fn test_layout_takes_precedence() {
        let form = SettingsForm {
            hero_headline: Some("Headline".to_string()),
            image_layout: Some(r#"["https://a/1.png","new_file_0"]"#.to_string()),
            current_images: Some(r#"["ignored"]"#.to_string()),
            new_images: vec![PendingFile::new("x.png", "image/png", vec![1])],
            ..Default::default()
        };

        let submission = form.into_submission().unwrap();
        assert_eq!(
            submission.images,
            ImageSubmission::Layout(vec![LayoutEntry::existing("https://a/1.png"), LayoutEntry::pending(0)])
        );
        assert_eq!(submission.hero_headline, "Headline");
        assert_eq!(submission.hero_subheadline, "");
        assert_eq!(submission.show_products_section, None);
        assert_eq!(submission.files.len(), 1);
    }

    #[test]
    fn test_current_images_fallback() {
        let form = SettingsForm {
            current_images: Some(r#"["https://a/1.png"]"#.to_string()),
            show_products_section: Some("off".to_string()),
            expected_version: Some("4".to_string()),
            ..Default::default()
        };

        let submission = form.into_submission().unwrap();
        assert_eq!(
            submission.images,
            ImageSubmission::Appended(vec!["https://a/1.png".to_string()])
        );
        assert_eq!(submission.show_products_section, Some(false));
        assert_eq!(submission.expected_version, Some(4));
    }

    #[test]
    fn test_invalid_layout_rejected() {
        let form = SettingsForm {
            image_layout: Some("{".to_string()),
            ..Default::default()
        };
        assert!(matches!(form.into_submission(), Err(SiteError::Validation(_))));
    }
}
