//! Prompt templates for the generative collaborators.

pub const SUMMARY_SYSTEM_PROMPT: &str =
    "You are a helpful assistant that creates concise summaries.";

pub fn build_summary_user_prompt(text: &str) -> String {
    format!("Summarize this in 2-3 sentences: {text}")
}

pub fn build_selection_system_prompt(desired: usize) -> String {
    format!(
        r#"You are selecting URLs for a "second brain" app that helps users remember content they'll FORGET where they found it.

CRITICAL DISTINCTION:
- SAVE: Content from random websites users will forget the location of
- IGNORE: Official documentation/sites users can easily find again by searching

INCLUDE (Worth Remembering):
- Blog articles on specific topics (cooking, optimization, debugging, etc.)
- Personal experience posts (Medium, Dev.to, personal blogs)
- News articles (sports, tech news, stories)
- Case studies, startup stories, failure stories
- Tutorials from random blogs (not official docs)
- Forum answers (Stack Overflow specific answers, Reddit threads)
- Opinion pieces, think pieces
- "How I solved X" type articles
- Product reviews, comparisons

EXCLUDE (Easy to Find Again):
- Official documentation (React docs, Supabase docs, OpenAI docs, etc.)
- Any URL containing: /docs/, /guide/, /documentation/, /api/, /reference/
- Getting started pages (/getting-started, /quickstart)
- Code repositories, code files, or tree views
- Company websites (homepages, about pages, pricing)
- Shared document and drive links
- Product landing pages
- Tool/framework official sites

REASONING:
If the user needs official docs, they'll search for them - always findable.
If the user read "how I debugged a weird issue" on some blog - they'll forget the URL.

Consider:
1. Is this from an OFFICIAL site? -> EXCLUDE
2. Is this a PERSONAL/BLOG article? -> INCLUDE
3. Is this NEWS or OPINION? -> INCLUDE
4. Would the user forget where they found this? -> INCLUDE
5. Can the user easily search for this again? -> EXCLUDE

Respond ONLY with a JSON array:
["url1", "url2", "url3", ...]

Return exactly {desired} URLs, ordered by quality (best first)."#
    )
}

pub fn build_selection_user_prompt(url_data: &str, desired: usize) -> String {
    format!(
        r#"Here are the URLs to analyze (ordered by recency, most recent first):

{url_data}

Select the top {desired} or even fewer, but URLs must contain the most valuable, informative content for a personal knowledge base."#
    )
}

pub const ANSWER_SYSTEM_PROMPT: &str = r#"You are a helpful assistant that answers questions based on the user's saved articles.

IMPORTANT RULES:
1. ONLY use information from the provided sources
2. Cite sources by their number [1], [2], etc.
3. If sources don't contain the answer, say so clearly
4. Keep answers concise (2-3 sentences)
5. Always reference which sources you used

Example:
User: "What did I read about cooking steak?"
Assistant: "Based on your saved articles, the reverse sear method is recommended [1][2]. Cook the steak in the oven at low temperature until it reaches 125F, then sear in a hot pan for 1-2 minutes per side [1].""#;

pub fn build_answer_user_prompt(sources_text: &str, query: &str) -> String {
    format!(
        r#"Here are the user's saved articles:

{sources_text}

User's question: {query}

Provide a helpful answer based ONLY on the sources above. Cite sources using [1], [2], etc."#
    )
}
