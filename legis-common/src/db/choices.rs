//! Enumerated column values
//!
//! Stored as their uppercase code (`EM_TRAMITACAO`, `SIM`, ...) and shown to
//! users by their Portuguese label.

use crate::Error;

macro_rules! choice_enum {
    (
        $(#[$meta:meta])*
        $name:ident {
            $($variant:ident => ($code:literal, $label:literal)),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize, sqlx::Type)]
        #[serde(rename_all = "SCREAMING_SNAKE_CASE")]
        #[sqlx(rename_all = "SCREAMING_SNAKE_CASE")]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $code),+
                }
            }

            pub fn label(&self) -> &'static str {
                match self {
                    $($name::$variant => $label),+
                }
            }
        }

        impl std::str::FromStr for $name {
            type Err = Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.trim().to_uppercase().as_str() {
                    $($code => Ok($name::$variant),)+
                    other => Err(Error::InvalidInput(format!(
                        "unknown {} value '{}'",
                        stringify!($name),
                        other
                    ))),
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.label())
            }
        }
    };
}

choice_enum! {
    /// Procedural situation of a proposal
    ProposalStatus {
        EmTramitacao => ("EM_TRAMITACAO", "Em Tramitação"),
        Aprovada => ("APROVADA", "Aprovada"),
        Rejeitada => ("REJEITADA", "Rejeitada"),
        Arquivada => ("ARQUIVADA", "Arquivada"),
        Retirada => ("RETIRADA", "Retirada"),
    }
}

choice_enum! {
    /// Individual vote of a deputy in a voting session
    VoteChoice {
        Sim => ("SIM", "Sim"),
        Nao => ("NAO", "Não"),
        Abstencao => ("ABSTENCAO", "Abstenção"),
        Obstrucao => ("OBSTRUCAO", "Obstrução"),
        Ausente => ("AUSENTE", "Ausente"),
    }
}

choice_enum! {
    ImpactLevel {
        Baixo => ("BAIXO", "Baixo"),
        Medio => ("MEDIO", "Médio"),
        Alto => ("ALTO", "Alto"),
        Critico => ("CRITICO", "Crítico"),
    }
}

choice_enum! {
    /// Publication state of a news article
    NewsStatus {
        Rascunho => ("RASCUNHO", "Rascunho"),
        Publicada => ("PUBLICADA", "Publicada"),
        Arquivada => ("ARQUIVADA", "Arquivada"),
    }
}

choice_enum! {
    TaskStatus {
        Pendente => ("PENDENTE", "Pendente"),
        EmAndamento => ("EM_ANDAMENTO", "Em Andamento"),
        EmRevisao => ("EM_REVISAO", "Em Revisão"),
        Concluida => ("CONCLUIDA", "Concluída"),
        Cancelada => ("CANCELADA", "Cancelada"),
    }
}

choice_enum! {
    TaskPriority {
        Baixa => ("BAIXA", "Baixa"),
        Media => ("MEDIA", "Média"),
        Alta => ("ALTA", "Alta"),
        Urgente => ("URGENTE", "Urgente"),
    }
}

choice_enum! {
    /// Window covered by an activity report
    ReportPeriod {
        Semanal => ("SEMANAL", "Semanal"),
        Mensal => ("MENSAL", "Mensal"),
        Trimestral => ("TRIMESTRAL", "Trimestral"),
        Anual => ("ANUAL", "Anual"),
    }
}

impl ReportPeriod {
    /// Length of the window in days
    pub fn days(&self) -> i64 {
        match self {
            ReportPeriod::Semanal => 7,
            ReportPeriod::Mensal => 30,
            ReportPeriod::Trimestral => 90,
            ReportPeriod::Anual => 365,
        }
    }
}

impl TaskPriority {
    /// Sort rank, higher is more urgent
    pub fn rank(&self) -> i64 {
        match self {
            TaskPriority::Baixa => 1,
            TaskPriority::Media => 2,
            TaskPriority::Alta => 3,
            TaskPriority::Urgente => 4,
        }
    }
}

/// SQL expression ranking `tasks.prioridade` like [`TaskPriority::rank`]
pub(crate) const TASK_PRIORITY_RANK_SQL: &str = "CASE t.prioridade \
     WHEN 'URGENTE' THEN 4 WHEN 'ALTA' THEN 3 WHEN 'MEDIA' THEN 2 ELSE 1 END";
