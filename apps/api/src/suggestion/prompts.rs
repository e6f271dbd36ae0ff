pub const CONTEXT_SCORE_PROMPT: &str = r#"Analyze one piece of daily context for a personal task manager.

Source type: {source_type}
Source title: {source_title}

Content:
{content}

Return a JSON object with exactly these fields:
{
  "keywords": ["lowercase single words that describe the topic or urgency"],
  "sentiment_score": <number from -1.0 (very negative) to 1.0 (very positive)>,
  "priority_score": <number from 0.0 (can wait) to 1.0 (needs action today)>
}

Rules:
- At most 10 keywords, no duplicates.
- Urgency words, deadlines and near-term times raise priority_score.
- Casual or leisure content keeps priority_score at or below 0.4."#;

pub const TASK_SUGGESTION_PROMPT: &str = r#"Suggest planning details for a task in a personal task manager.

Current time (UTC): {now}
Pending tasks already on the user's list: {workload}
Known categories: {categories}

Task title: {title}
Task description: {description}

Recent context:
{context}

Return a JSON object with exactly these fields:
{
  "priority_score": <number from 0.0 to 1.0>,
  "suggested_deadline": "YYYY-MM-DD HH:MM",
  "category": "one of the known categories, or a short new one",
  "tags": ["up to 3 lowercase tags"],
  "enhanced_description": "the task description enriched with relevant details from the context"
}

Rules:
- priority_score 0.8 or higher means the task must be done today.
- suggested_deadline must be after the current time; a heavier workload pushes it later.
- Do not invent facts that are not in the task or the context."#;

/// Fills `{key}` placeholders in one pass. Substituted values are never
/// scanned again, so user text containing `{title}` stays literal.
pub fn fill_template(template: &str, values: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        let tail = &rest[start + 1..];
        let hit = values.iter().find(|(key, _)| {
            tail.strip_prefix(*key).is_some_and(|after| after.starts_with('}'))
        });
        match hit {
            Some((key, value)) => {
                out.push_str(value);
                rest = &tail[key.len() + 1..];
            }
            None => {
                out.push('{');
                rest = tail;
            }
        }
    }
    out.push_str(rest);
    out
}
