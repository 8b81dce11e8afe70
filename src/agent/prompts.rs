/// Sentinel the model uses when no listed statute fits.
pub const NOTHING_FOUND: &str = "nichts gefunden";

pub const SYSTEM_PROMPT: &str = r#"Du bist ein sorgfaeltiger juristischer Rechercheassistent fuer oesterreichisches Bundesrecht.
Du beantwortest Rechtsfragen ausschliesslich auf Grundlage von Gesetzestexten, die du dir Schritt fuer Schritt suchst:
zuerst waehlst du passende Kategorien des Rechtsindex, dann ein Gesetz, dann die relevanten Abschnitte dieses Gesetzes.

Regeln:
- Antworte IMMER ausschliesslich mit einem JSON-Objekt im verlangten Format. Kein Text davor oder danach.
- Zitiere Kategorien, Gesetze und Abschnitte exakt so, wie sie dir angezeigt werden.
- Erfinde keine Gesetze und keine Inhalte. Wenn nichts passt, sag es.
- Wenn du den Gesetzestext nicht fuer ausreichend haeltst, suche weiter statt zu raten."#;

pub fn choose_category(
    context: &str,
    categories: &[&str],
    examples: &[String],
    output_format: &str,
) -> String {
    format!(
        r#"{context}

Waehle die Kategorie, in der die Antwort auf die Rechtsfrage am wahrscheinlichsten zu finden ist.

Verfuegbare Kategorien:
{categories}

Beispiele fuer gueltige Antworten:
{examples}

Gib deine Antwort ausschliesslich als JSON in folgendem Format aus:
{output_format}"#,
        categories = categories.join("\n"),
        examples = examples.join("\n"),
    )
}

pub fn choose_statute(
    context: &str,
    statutes: &[String],
    searched: &[String],
    output_format: &str,
) -> String {
    let searched = if searched.is_empty() {
        "(noch keine)".to_string()
    } else {
        searched.join("\n")
    };
    format!(
        r#"{context}

Waehle das Gesetz, das die Rechtsfrage am ehesten beantworten kann.

Verfuegbare Gesetze:
{statutes}

Bereits durchsuchte Gesetze (nicht erneut waehlen):
{searched}

Wenn keines der Gesetze passt, antworte in beiden Feldern mit "{NOTHING_FOUND}".

Gib deine Antwort ausschliesslich als JSON in folgendem Format aus:
{output_format}"#,
        statutes = statutes.join("\n"),
    )
}

pub fn summarize(output_format: &str) -> String {
    format!(
        r#"Fasse deinen bisherigen Fortschritt bei der Beantwortung der Rechtsfrage zusammen.
Halte fest, welche Kategorien und Gesetze du angesehen hast und was du dabei herausgefunden hast.

Gib deine Antwort ausschliesslich als JSON in folgendem Format aus:
{output_format}"#
    )
}

pub fn choose_section(
    context: &str,
    statute: &str,
    headings: &[&str],
    output_format: &str,
) -> String {
    format!(
        r#"{context}

Du untersuchst das Gesetz: {statute}

Gliederung des aktuellen Abschnitts:
{headings}

Waehle den Abschnitt, der die Rechtsfrage am wahrscheinlichsten beantwortet.
Achte darauf, dass du immer die gesamte Zeile zitierst und nicht nur die Nummer des Abschnitts!

Gib deine Antwort ausschliesslich als JSON in folgendem Format aus:
{output_format}"#,
        headings = headings.join("\n"),
    )
}

pub fn analyze_full(context: &str, statute: &str, text: &str, output_format: &str) -> String {
    format!(
        r#"{context}

Hier ist die geltende Fassung des gesamten Gesetzes {statute}:

{text}

Pruefe, ob dieses Gesetz ausreicht, um die Rechtsfrage zu beantworten.

Gib deine Antwort ausschliesslich als JSON in folgendem Format aus:
{output_format}"#
    )
}

pub fn analyze_section(
    context: &str,
    statute: &str,
    section: &str,
    text: &str,
    output_format: &str,
) -> String {
    format!(
        r#"{context}

Hier ist der gewaehlte Teil des Gesetzes {statute}:

Abschnitt: {section}

{text}

Pruefe, ob dieser Teil ausreicht, um die Rechtsfrage zu beantworten.

Gib deine Antwort ausschliesslich als JSON in folgendem Format aus:
{output_format}"#
    )
}

pub fn final_report(output_format: &str) -> String {
    format!(
        r#"Du hast genug Informationen gesammelt. Erstelle jetzt den finalen Bericht zur Rechtsfrage.

Gib deine Antwort ausschliesslich als JSON in folgendem Format aus:
{output_format}"#
    )
}

pub fn extract_terms(plain_answer: &str, output_format: &str) -> String {
    format!(
        r#"Hier ist eine Antwort, die sich an juristische Laien richtet:

{plain_answer}

Liste alle juristischen Fachbegriffe auf, die ein Laie vermutlich nicht versteht.
Wenn es keine solchen Begriffe gibt, gib eine leere Liste aus.

Gib deine Antwort ausschliesslich als JSON in folgendem Format aus:
{output_format}"#
    )
}

pub fn term_questions(terms: &[String], output_format: &str) -> String {
    format!(
        r#"Formuliere fuer jeden der folgenden Fachbegriffe eine kurze Frage, deren Antwort den Begriff fuer einen Laien erklaert:
{terms}

Gib deine Antwort ausschliesslich als JSON in folgendem Format aus:
{output_format}"#,
        terms = terms.join("\n"),
    )
}

/// Fixed corrective instruction after an off-schema reply.
pub fn schema_retry(output_format: &str) -> String {
    format!(
        r#"Dein vorheriger Output entsprach nicht dem geforderten Schema. Versuche es erneut, ohne Erklaerung.
Antworte ausschliesslich mit JSON in folgendem Format:
{output_format}"#
    )
}

/// Question plus the latest progress summary, shared by the choice prompts.
pub fn question_context(question: &str, summary: &str) -> String {
    if summary.trim().is_empty() {
        format!("Zu beantwortende Rechtsfrage: {question}")
    } else {
        format!(
            "Zu beantwortende Rechtsfrage: {question}\n\nZusammenfassung des bisherigen Fortschritts: {summary}"
        )
    }
}
