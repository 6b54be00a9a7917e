//! Prompt texts (Portuguese, matching the content they analyse)

pub const LEGISLATIVE_ANALYST: &str = "Você é um especialista em análise legislativa.";
pub const IMPACT_ANALYST: &str = "Você é um especialista em análise de impacto legislativo.";
pub const SENTIMENT_ANALYST: &str = "Você é um especialista em análise de sentimento.";
pub const CONTENT_ANALYST: &str = "Você é um especialista em análise de conteúdo.";
pub const TERMINOLOGY_EXPERT: &str =
    "Você é um especialista em terminologia técnica para sistemas de informação governamentais.";

pub fn summary(text: &str) -> String {
    format!(
        "Gere um resumo conciso e informativo do seguinte texto legislativo:\n\n{}\n\nResumo:",
        text
    )
}

pub fn impact(text: &str) -> String {
    format!(
        "Analise o impacto da seguinte proposição legislativa:\n\n{}\n\n\
         Forneça uma análise estruturada considerando:\n\
         1. Nível de impacto (Baixo/Médio/Alto/Crítico)\n\
         2. Áreas afetadas\n\
         3. Impacto econômico\n\
         4. Impacto social\n\
         5. Impacto ambiental\n\
         6. Stakeholders principais",
        text
    )
}

pub fn key_points(text: &str) -> String {
    format!(
        "Liste os principais pontos da seguinte proposição legislativa:\n\n{}\n\n\
         Forneça uma lista numerada com os pontos mais importantes.",
        text
    )
}

pub fn speech_sentiment(text: &str) -> String {
    format!(
        "Analise o sentimento do seguinte discurso parlamentar:\n\n{}\n\n\
         Classifique como: Positivo, Negativo, Neutro ou Misto",
        text
    )
}

pub fn themes(text: &str) -> String {
    format!(
        "Identifique os principais temas abordados no seguinte discurso:\n\n{}\n\n\
         Liste os temas em ordem de relevância.",
        text
    )
}

pub fn gender_definition(nome: &str) -> String {
    format!(
        "Escreva uma definição técnica e objetiva sobre o conceito de \"{}\" \n\
         no contexto de identificação de gênero/sexo em registros oficiais e sistemas de informação.\n\n\
         A definição deve:\n\
         - Ter no máximo 500 caracteres\n\
         - Ser formal e técnica\n\
         - Ser adequada para uso em sistemas governamentais\n\
         - Evitar linguagem discriminatória\n\
         - Focar no aspecto de identificação e classificação\n\n\
         Responda apenas com a definição, sem introduções ou explicações adicionais.",
        nome
    )
}
