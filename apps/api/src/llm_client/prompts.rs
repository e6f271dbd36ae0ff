// Shared prompt fragments. Each module that talks to the provider keeps its
// own prompts.rs next to it; only cross-cutting pieces live here.

/// System prompt that enforces JSON-only output.
pub const JSON_ONLY_SYSTEM: &str = "You are a precise, structured assistant for a personal task manager. \
    You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences. \
    Do NOT include explanations or apologies.";
