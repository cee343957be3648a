// Built-in EGRA/EGMA metric table

use super::definition::{Assessment, Band, DisplayNames, MetricDefinition};

struct BuiltinMetric {
    code: &'static str,
    assessment: Assessment,
    mastery: f64,
    developing: (f64, f64),
    emerging: (f64, f64),
    international: f64,
    en: &'static str,
    fr: &'static str,
    ar: &'static str,
}

const BUILTIN: &[BuiltinMetric] = &[
    BuiltinMetric {
        code: "clpm",
        assessment: Assessment::Egra,
        mastery: 44.0,
        developing: (31.0, 43.0),
        emerging: (0.0, 30.0),
        international: 40.0,
        en: "Correct Letters Per Minute",
        fr: "Lettres Correctes Par Minute",
        ar: "الحروف الصحيحة في الدقيقة",
    },
    BuiltinMetric {
        code: "phoneme",
        assessment: Assessment::Egra,
        mastery: 41.0,
        developing: (24.0, 40.0),
        emerging: (0.0, 23.0),
        international: 8.0,
        en: "Phoneme Awareness",
        fr: "Conscience Phonémique",
        ar: "الوعي الصوتي",
    },
    BuiltinMetric {
        code: "sound_word",
        assessment: Assessment::Egra,
        mastery: 60.0,
        developing: (30.0, 59.0),
        emerging: (0.0, 29.0),
        international: 18.0,
        en: "Correctly Read Words",
        fr: "Mots Lus Correctement",
        ar: "الكلمات المقروءة بشكل صحيح",
    },
    BuiltinMetric {
        code: "cwpm",
        assessment: Assessment::Egra,
        mastery: 29.0,
        developing: (17.0, 28.0),
        emerging: (0.0, 16.0),
        international: 45.0,
        en: "Correct Words Per Minute",
        fr: "Mots Corrects Par Minute",
        ar: "الكلمات الصحيحة في الدقيقة",
    },
    BuiltinMetric {
        code: "listening",
        assessment: Assessment::Egra,
        mastery: 75.0,
        developing: (50.0, 74.0),
        emerging: (0.0, 49.0),
        international: 4.0,
        en: "Listening Comprehension",
        fr: "Compréhension Orale",
        ar: "فهم الاستماع",
    },
    BuiltinMetric {
        code: "orf",
        assessment: Assessment::Egra,
        mastery: 50.0,
        developing: (30.0, 49.0),
        emerging: (0.0, 29.0),
        international: 45.0,
        en: "Oral Reading Fluency",
        fr: "Fluidité de Lecture Orale",
        ar: "طلاقة القراءة الشفهية",
    },
    BuiltinMetric {
        code: "comprehension",
        assessment: Assessment::Egra,
        mastery: 75.0,
        developing: (50.0, 74.0),
        emerging: (0.0, 49.0),
        international: 4.0,
        en: "Reading Comprehension",
        fr: "Compréhension de Lecture",
        ar: "فهم القراءة",
    },
    BuiltinMetric {
        code: "number_id",
        assessment: Assessment::Egma,
        mastery: 56.0,
        developing: (49.0, 55.0),
        emerging: (0.0, 48.0),
        international: 20.0,
        en: "Number Identification",
        fr: "Identification des Nombres",
        ar: "تحديد الأرقام",
    },
    BuiltinMetric {
        code: "discrimin",
        assessment: Assessment::Egma,
        mastery: 60.0,
        developing: (30.0, 59.0),
        emerging: (0.0, 29.0),
        international: 8.0,
        en: "Number Discrimination",
        fr: "Discrimination des Nombres",
        ar: "تمييز الأرقام",
    },
    BuiltinMetric {
        code: "missing_number",
        assessment: Assessment::Egma,
        mastery: 60.0,
        developing: (30.0, 59.0),
        emerging: (0.0, 29.0),
        international: 8.0,
        en: "Missing Number",
        fr: "Nombre Manquant",
        ar: "الرقم المفقود",
    },
    BuiltinMetric {
        code: "addition",
        assessment: Assessment::Egma,
        mastery: 10.0,
        developing: (6.0, 9.0),
        emerging: (0.0, 5.0),
        international: 16.0,
        en: "Addition",
        fr: "Addition",
        ar: "الجمع",
    },
    BuiltinMetric {
        code: "subtraction",
        assessment: Assessment::Egma,
        mastery: 10.0,
        developing: (6.0, 9.0),
        emerging: (0.0, 5.0),
        international: 14.0,
        en: "Subtraction",
        fr: "Soustraction",
        ar: "الطرح",
    },
    BuiltinMetric {
        code: "problems",
        assessment: Assessment::Egma,
        mastery: 60.0,
        developing: (30.0, 59.0),
        emerging: (0.0, 29.0),
        international: 4.0,
        en: "Problems",
        fr: "Problèmes",
        ar: "المسائل",
    },
];

pub(super) fn definitions() -> Vec<MetricDefinition> {
    BUILTIN
        .iter()
        .map(|m| MetricDefinition {
            code: m.code.to_string(),
            names: DisplayNames {
                en: m.en.to_string(),
                fr: Some(m.fr.to_string()),
                ar: Some(m.ar.to_string()),
            },
            assessment: m.assessment,
            mastery: m.mastery,
            developing: Band::new(m.developing.0, m.developing.1),
            emerging: Band::new(m.emerging.0, m.emerging.1),
            international_standard: Some(m.international),
        })
        .collect()
}
