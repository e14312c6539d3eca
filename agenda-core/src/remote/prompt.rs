//! System prompt for the remote model.

use chrono::{DateTime, Datelike, Duration, FixedOffset, NaiveDate, Weekday};

use crate::contacts::{KnownContact, format_for_prompt};

const TEMPLATE: &str = r#"Você é um assistente que agenda reuniões conversando em português do Brasil, de forma simpática e objetiva.

## Agora
- Hoje: {today}
- Dia da semana: {weekday}
- Hora: {time}
- Fuso: {timezone}

## O que coletar
1. Participantes: email (obrigatório) e nome
2. Data
3. Horário de início (e de fim; sem fim, considere 1 hora)
4. Título ou assunto
5. Uma descrição curta

## Como conversar
- Pergunte só o que falta, uma ou duas coisas por vez
- Aproveite tudo que o usuário já informou
- "amanhã" é {tomorrow}; dias da semana são a próxima ocorrência
- Email sem nome: deduza o nome do email (ana.souza@ vira Ana Souza)
- Nome sem email: peça o email

## Formato da resposta
Enquanto faltar algo, responda apenas com texto, sem JSON.
Quando tiver participantes, data, horário, título e descrição, responda SOMENTE com:

```json
{
  "ready": true,
  "title": "Título",
  "participants": ["email@exemplo.com"],
  "participant_names": ["Nome"],
  "date": "YYYY-MM-DD",
  "start_time": "HH:MM:SS",
  "end_time": "HH:MM:SS",
  "description": "Descrição",
  "dateLabel": "Amanhã (DD/MM)",
  "confidence": 0.95
}
```

participants e participant_names precisam ter o mesmo tamanho."#;

/// Build the system prompt for a conversation happening at `now`.
pub fn system_prompt(now: DateTime<FixedOffset>, timezone: &str, contacts: &[KnownContact]) -> String {
    let today = now.date_naive();
    let tomorrow = today + Duration::days(1);

    let prompt = TEMPLATE
        .replace("{today}", &long_date(today))
        .replace("{weekday}", weekday_name(today.weekday()))
        .replace("{time}", &now.format("%H:%M").to_string())
        .replace("{timezone}", timezone)
        .replace("{tomorrow}", &long_date(tomorrow));

    prompt + &format_for_prompt(contacts)
}

fn long_date(date: NaiveDate) -> String {
    format!("{} ({})", date.format("%Y-%m-%d"), date.format("%d/%m/%Y"))
}

fn weekday_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "Segunda-feira",
        Weekday::Tue => "Terça-feira",
        Weekday::Wed => "Quarta-feira",
        Weekday::Thu => "Quinta-feira",
        Weekday::Fri => "Sexta-feira",
        Weekday::Sat => "Sábado",
        Weekday::Sun => "Domingo",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn now() -> DateTime<FixedOffset> {
        FixedOffset::west_opt(3 * 3600)
            .unwrap()
            .with_ymd_and_hms(2025, 1, 10, 9, 5, 0)
            .unwrap()
    }

    #[test]
    fn prompt_carries_reference_time() {
        let prompt = system_prompt(now(), "America/Sao_Paulo", &[]);
        assert!(prompt.contains("Hoje: 2025-01-10 (10/01/2025)"));
        assert!(prompt.contains("Dia da semana: Sexta-feira"));
        assert!(prompt.contains("Hora: 09:05"));
        assert!(prompt.contains("\"amanhã\" é 2025-01-11 (11/01/2025)"));
        assert!(prompt.contains("Fuso: America/Sao_Paulo"));
        assert!(!prompt.contains("{today}") && !prompt.contains("{tomorrow}"));
        assert!(!prompt.contains("Contatos"));
    }

    #[test]
    fn prompt_lists_contacts() {
        let contacts = vec![KnownContact {
            email: "ana@x.com".into(),
            name: "Ana".into(),
            meeting_count: 3,
            last_used: Utc.with_ymd_and_hms(2025, 1, 9, 12, 0, 0).unwrap(),
        }];
        let prompt = system_prompt(now(), "America/Sao_Paulo", &contacts);
        assert!(prompt.ends_with("- Ana (ana@x.com) — 3 reunião(ões)"));
    }
}
