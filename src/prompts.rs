use crate::models::RoomMode;

pub const INTERIOR: &str = include_str!("../data/prompts/interior.txt");

pub const MIN_VARIATIONS: i64 = 1;
pub const MAX_VARIATIONS: i64 = 3;
pub const DEFAULT_VARIATIONS: i64 = 1;

const UNKNOWN_DIMENSION: &str = "unknown";
const UNSPECIFIED_ROOM: &str = "unspecified";

#[derive(Debug, Clone, Default)]
pub struct PromptOptions {
    pub mode: RoomMode,
    pub room_type_hint: Option<String>,
    pub num_variations: Option<i64>,
}

/// Replace `{{key}}` placeholders in a template string.
///
/// The template is scanned once, so substituted values are never themselves
/// searched for placeholders. Unknown keys are left as written.
pub fn render(template: &str, vars: &[(&str, &str)]) -> String {
    let mut result = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find("{{") {
        result.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let Some(end) = after.find("}}") else {
            rest = &rest[start..];
            break;
        };

        let key = &after[..end];
        match vars.iter().find(|(name, _)| *name == key) {
            Some((_, value)) => result.push_str(value),
            None => result.push_str(&rest[start..start + 2 + end + 2]),
        }
        rest = &after[end + 2..];
    }

    result.push_str(rest);
    result
}

/// Effective number of variations, always within `[1, 3]`.
pub fn clamp_variations(requested: Option<i64>) -> u32 {
    requested
        .unwrap_or(DEFAULT_VARIATIONS)
        .clamp(MIN_VARIATIONS, MAX_VARIATIONS) as u32
}

/// Build the generation prompt for a room photo and furniture list.
pub fn build_prompt(
    furniture: &[String],
    width: Option<u32>,
    height: Option<u32>,
    options: &PromptOptions,
) -> String {
    let size = format!(
        "width {}px x height {}px",
        dimension_text(width),
        dimension_text(height)
    );
    let room_type = options
        .room_type_hint
        .as_deref()
        .map(str::trim)
        .filter(|hint| !hint.is_empty())
        .unwrap_or(UNSPECIFIED_ROOM);
    let count = clamp_variations(options.num_variations).to_string();

    let items: Vec<&str> = furniture
        .iter()
        .map(|name| name.trim())
        .filter(|name| !name.is_empty())
        .collect();

    let furniture_rules = if options.mode == RoomMode::Manual && !items.is_empty() {
        let list = items
            .iter()
            .map(|name| format!("\"{}\"", name))
            .collect::<Vec<_>>()
            .join(", ");
        format!(
            "- Manual placement mode. Use only the furniture listed below and do not add anything else.\n- Allowed furniture: {}",
            list
        )
    } else {
        format!(
            "- Automatic placement mode. Choose and arrange furniture suited to the room type ({}).",
            room_type
        )
    };

    let rendered = render(
        INTERIOR,
        &[
            ("size", &size),
            ("room_type", room_type),
            ("furniture_rules", &furniture_rules),
            ("count", &count),
        ],
    );

    rendered
        .lines()
        .filter(|line| !line.trim().is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Prompt sent for one variation of a multi-variation request.
pub fn variation_prompt(base: &str, index: u32) -> String {
    format!("{}\n(variation {})", base, index)
}

fn dimension_text(value: Option<u32>) -> String {
    match value {
        Some(v) if v > 0 => v.to_string(),
        _ => UNKNOWN_DIMENSION.to_string(),
    }
}
