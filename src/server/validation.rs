use crate::server::response::ApiError;

const MAX_TITLE_LEN: usize = 200;
const MAX_CONTENT_LEN: usize = 20_000;
const MAX_SECTION_LEN: usize = 64;
const MAX_BIO_LEN: usize = 1_000;
const MAX_ROLE_NAME_LEN: usize = 32;

pub const DEFAULT_PAGE_SIZE: u32 = 10;
pub const MAX_PAGE_SIZE: u32 = 50;

fn validate_text(value: &str, field: &str, max_len: usize) -> Result<(), ApiError> {
    if value.trim().is_empty() {
        return Err(ApiError::bad_request(format!("{field} cannot be empty")));
    }
    if value.chars().count() > max_len {
        return Err(ApiError::bad_request(format!(
            "{field} cannot exceed {max_len} characters"
        )));
    }
    Ok(())
}

pub fn validate_thread_title(title: &str) -> Result<(), ApiError> {
    validate_text(title, "Title", MAX_TITLE_LEN)
}

pub fn validate_content(content: &str) -> Result<(), ApiError> {
    validate_text(content, "Content", MAX_CONTENT_LEN)
}

/// Sections are slugs: lowercase alphanumerics and hyphens. `all` is reserved
/// as the search wildcard.
pub fn validate_section(section: &str) -> Result<(), ApiError> {
    validate_text(section, "Section", MAX_SECTION_LEN)?;
    if !section
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
    {
        return Err(ApiError::bad_request(
            "Section can only contain lowercase letters, digits, and hyphens",
        ));
    }
    if section == "all" {
        return Err(ApiError::bad_request("Section name 'all' is reserved"));
    }
    Ok(())
}

pub fn validate_bio(bio: &str) -> Result<(), ApiError> {
    if bio.chars().count() > MAX_BIO_LEN {
        return Err(ApiError::bad_request(format!(
            "Bio cannot exceed {MAX_BIO_LEN} characters"
        )));
    }
    Ok(())
}

pub fn validate_role_name(name: &str) -> Result<(), ApiError> {
    validate_text(name, "Role name", MAX_ROLE_NAME_LEN)
}

/// Accepts `#RRGGBB`.
pub fn validate_color(color: &str) -> Result<(), ApiError> {
    let valid = color.len() == 7
        && color.starts_with('#')
        && color[1..].chars().all(|c| c.is_ascii_hexdigit());
    if !valid {
        return Err(ApiError::bad_request("Color must look like #RRGGBB"));
    }
    Ok(())
}

/// Joins request tags into the stored comma separated form, dropping blanks.
pub fn normalize_tags(tags: &[String]) -> String {
    tags.iter()
        .map(|t| t.trim())
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(",")
}

/// Clamps caller supplied paging: page below 1 becomes 1, a page size outside
/// `1..=MAX_PAGE_SIZE` falls back to [`DEFAULT_PAGE_SIZE`].
pub fn clamp_page(page: Option<i64>, page_size: Option<i64>) -> (u32, u32) {
    let page = page
        .filter(|p| *p >= 1)
        .and_then(|p| u32::try_from(p).ok())
        .unwrap_or(1);
    let page_size = page_size
        .filter(|s| (1..=i64::from(MAX_PAGE_SIZE)).contains(s))
        .and_then(|s| u32::try_from(s).ok())
        .unwrap_or(DEFAULT_PAGE_SIZE);
    (page, page_size)
}
