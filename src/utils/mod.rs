use url::Url;

pub mod embedded_json;

pub use embedded_json::{extract_balanced_json, MAX_EMBEDDED_JSON_LEN};

/// Path prefixes that carry the video id as the next segment
const ID_PATH_PREFIXES: &[&str] = &["embed", "shorts", "v", "live"];

/// Turn user input (bare id or watch/share URL) into a video id
pub fn extract_video_id(input: &str) -> Option<String> {
    let input = input.trim();
    if input.is_empty() {
        return None;
    }

    let looks_like_url = input.starts_with("http://")
        || input.starts_with("https://")
        || input.contains("youtube.com/")
        || input.contains("youtu.be/");
    if !looks_like_url {
        return Some(input.to_string());
    }

    let url_str = if input.starts_with("http://") || input.starts_with("https://") {
        input.to_string()
    } else {
        format!("https://{}", input)
    };
    let url = Url::parse(&url_str).ok()?;
    let host = url.host_str()?;

    if let Some((_, id)) = url.query_pairs().find(|(k, _)| k == "v") {
        if !id.is_empty() {
            return Some(id.into_owned());
        }
    }

    let segments: Vec<&str> = url.path_segments()?.filter(|s| !s.is_empty()).collect();

    if host == "youtu.be" {
        return segments.first().map(|s| s.to_string());
    }

    match segments.as_slice() {
        [prefix, id, ..] if ID_PATH_PREFIXES.contains(prefix) => Some(id.to_string()),
        _ => None,
    }
}

/// Drop the `exp` query flag and its entry in the `sparams` list.
///
/// The upstream sometimes answers caption requests carrying `exp=xpe` with an empty body.
pub fn strip_expiry_flag(url: &str) -> String {
    let Some((base, query)) = url.split_once('?') else {
        return url.to_string();
    };

    let params = query
        .split('&')
        .filter(|p| !p.is_empty() && param_name(p) != "exp")
        .map(|p| {
            if param_name(p) == "sparams" {
                repair_sparams(p)
            } else {
                p.to_string()
            }
        })
        .collect();

    join_query(base, params)
}

/// Set the caption `fmt` parameter, or remove it when `format` is `None`
pub fn with_format(url: &str, format: Option<&str>) -> String {
    let (base, query) = url.split_once('?').unwrap_or((url, ""));

    let mut params: Vec<String> = query
        .split('&')
        .filter(|p| !p.is_empty() && param_name(p) != "fmt")
        .map(str::to_string)
        .collect();

    if let Some(format) = format {
        params.push(format!("fmt={}", format));
    }

    join_query(base, params)
}

fn param_name(param: &str) -> &str {
    param.split_once('=').map_or(param, |(name, _)| name)
}

fn repair_sparams(param: &str) -> String {
    let Some((name, value)) = param.split_once('=') else {
        return param.to_string();
    };

    let separator = if value.contains("%2C") {
        "%2C"
    } else if value.contains("%2c") {
        "%2c"
    } else {
        ","
    };

    let kept: Vec<&str> = value.split(separator).filter(|entry| *entry != "exp").collect();
    format!("{}={}", name, kept.join(separator))
}

fn join_query(base: &str, params: Vec<String>) -> String {
    if params.is_empty() {
        base.to_string()
    } else {
        format!("{}?{}", base, params.join("&"))
    }
}
