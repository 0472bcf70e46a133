use crate::checks::Review;

pub(crate) const SCALE_TICKS_SYSTEM: &str = "\
You review a chart together with the request it was drawn for. Judge only two things:

- Scale: the value scale must allow accurate reading of values. Unconventional scales, such as an inverted y axis, are inappropriate.
- Ticks: when axes are present, tick choices must be clear and conventional. Counts of whole entities shown with fractional ticks are inappropriate.

Ignore the order of the data. Answer with JSON only:
{
    \"Appropriate\": true or false,
    \"Rationale\": \"a brief reason\"
}";

pub(crate) const READABILITY_SYSTEM: &str = "\
Rate how easy the chart is to read on a scale from 1 (very hard) to 5 (very easy). \
You get the request the chart was drawn for, the chart image, and possibly reviews from other reviewers. \
Reason about the chart before scoring. Answer with JSON only:
{
    \"Rationale\": \"a brief reason\",
    \"Score\": 1-5
}

A clean chart with legible labels and distinguishable series earns 5. \
A chart whose axes or encodings mislead the reader (an inverted y axis, fractional month ticks on a bar chart) earns 1 even without overflow or overlap.";

pub(crate) const READABILITY_FOCUS: &str = "\
Assess readability: layout, scale and ticks, title and labels, colors, and how easily information can be extracted. \
The data and the order in the chart are already verified; do not judge them.";

pub(crate) fn scale_ticks_text(question: &str, ticks: Option<(&[String], &[String])>) -> String {
    let ticks_desc = match ticks {
        Some((x, y)) => format!(
            "Ticks extracted from the visualization:\n- x axis ticks: {}\n- y axis ticks: {}\n\n",
            x.join(","),
            y.join(",")
        ),
        None => String::new(),
    };
    format!(
        "Visualization specification: {}\n\n{}Visualization image, already verified for DATA and ORDER accuracy:",
        question, ticks_desc
    )
}

pub(crate) fn readability_text(question: &str, reviews: &[Review]) -> String {
    let mut text = format!("Visualization Requirement: {}\n\n", question);
    if !reviews.is_empty() {
        text.push_str("Other Reviews:\n");
        let lines: Vec<String> = reviews
            .iter()
            .map(|r| format!("- {}: {}", r.aspect, r.content))
            .collect();
        text.push_str(&lines.join("\n"));
        text.push_str("\n\n");
    }
    text.push_str("Visualization image:");
    text
}
