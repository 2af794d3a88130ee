//! The persona system prompt and the per-user context block.

/// Server emojis offered to the model, capped to keep the prompt small.
const MAX_CONTEXT_EMOJIS: usize = 50;
/// Role names offered to the model.
const MAX_CONTEXT_ROLES: usize = 10;

/// Fixed system prompt: persona, reply-format rules, and the directive
/// grammar the reply parser understands.
pub const SYSTEM_PROMPT: &str = r#"
You are Sage, a calm and precise assistant. Your role is to analyse, explain
and guide with care.

STYLE:
- Neutral, analytical tone. No filler sentences.
- Address the user by their display name.
- You may open with phrasings like "Analysis:", "Result:", "Conclusion:".

FORMAT RULES:
1. SHORT answers (1-2 sentences) are plain text, no rich block.
2. LONG answers (explanations, lists, analyses) MUST use a rich block.
3. When asked for code, wrap the code as $[the code here]
4. If the user follows up on the same topic, continue it briefly; if they
   change topic, switch immediately.
5. You may end a short answer with one of the server's emojis when fitting.

RICH BLOCKS:
- Text outside the block is optional (it may be empty).
- The block carries the full detailed explanation.
- Mandatory format:
  $embed[TITLE;DESCRIPTION;FOOTER;IMAGE;THUMBNAIL;AUTHOR;URL]
- All 7 fields must be present, separated by ;.
- Use _ for any field you leave empty.
- DESCRIPTION: use **bold**, lists (- item), and \n for line breaks.
- FOOTER: plain text without markdown.

VALID EXAMPLES:
Good question! $embed[How I work;**Analysis:**\n- Answer requests\n- Provide focused explanations;By Sage;_;_;_;_]

$embed[Title;Full description here;By Sage;_;_;_;_]

INVALID EXAMPLE:
$embed[Title;Description;By Sage;_;_;_]  (one field missing)

OTHER ACTION:
$nick[new_nickname;user_id]
"#;

/// What the hosting platform knows about the requesting user.
#[derive(Debug, Clone, Default)]
pub struct UserInfo {
    pub display_name: String,
    pub user_id: String,
    /// Server name; `None` in direct-message contexts.
    pub guild_name: Option<String>,
    /// Fully-qualified emoji references (`<:name:id>`) available here.
    pub emojis: Vec<String>,
    pub roles: Vec<String>,
}

/// Render the user-context block appended to every prompt.
pub fn build_user_context(info: &UserInfo) -> String {
    let mut lines = Vec::new();
    lines.push(format!("Display name (use it): {}", info.display_name));
    lines.push(format!("User ID: {}", info.user_id));
    match &info.guild_name {
        Some(name) => {
            lines.push(format!("Server: {}", name));
            let emojis: Vec<&str> = info
                .emojis
                .iter()
                .map(String::as_str)
                .take(MAX_CONTEXT_EMOJIS)
                .collect();
            if !emojis.is_empty() {
                lines.push(format!(
                    "Server emojis (use them in your replies): {}",
                    emojis.join(" ")
                ));
            }
        }
        None => lines.push("Context: DM".to_string()),
    }
    let roles: Vec<&str> = info
        .roles
        .iter()
        .map(String::as_str)
        .take(MAX_CONTEXT_ROLES)
        .collect();
    if !roles.is_empty() {
        lines.push(format!("Roles: {}", roles.join(", ")));
    }
    lines.join("\n")
}

/// Suffix the user-context block to a prompt.
pub fn append_user_context(prompt: &str, info: &UserInfo) -> String {
    format!(
        "{}\n\nUser info (to personalise your reply):\n{}",
        prompt,
        build_user_context(info)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dm_context_has_no_server_line() {
        let info = UserInfo {
            display_name: "alice".to_string(),
            user_id: "1".to_string(),
            ..Default::default()
        };
        let ctx = build_user_context(&info);
        assert!(ctx.contains("Context: DM"));
        assert!(!ctx.contains("Server:"));
    }

    #[test]
    fn guild_context_lists_capped_emojis_and_roles() {
        let info = UserInfo {
            display_name: "bob".to_string(),
            user_id: "2".to_string(),
            guild_name: Some("testserver".to_string()),
            emojis: (0..60).map(|i| format!("<:e{}:{}>", i, i)).collect(),
            roles: (0..15).map(|i| format!("role{}", i)).collect(),
        };
        let ctx = build_user_context(&info);
        assert!(ctx.contains("Server: testserver"));
        assert!(ctx.contains("<:e49:49>"));
        assert!(!ctx.contains("<:e50:50>"));
        assert!(ctx.contains("role9"));
        assert!(!ctx.contains("role10,"));
    }

    #[test]
    fn append_keeps_the_prompt_first() {
        let info = UserInfo {
            display_name: "c".to_string(),
            user_id: "3".to_string(),
            ..Default::default()
        };
        let out = append_user_context("hello", &info);
        assert!(out.starts_with("hello\n\n"));
        assert!(out.contains("User ID: 3"));
    }
}
