//! Voice roster for the random-voice reward.

use rand::Rng;

/// Every voice the synthesis endpoint answers to.
pub const VOICES: &[&str] = &[
    "Filiz", "Astrid", "Tatyana", "Maxim", "Carmen", "Ines", "Cristiano", "Vitoria",
    "Ricardo", "Maja", "Jan", "Jacek", "Ewa", "Ruben", "Lotte", "Liv", "Seoyeon",
    "Takumi", "Mizuki", "Giorgio", "Carla", "Bianca", "Karl", "Dora", "Mathieu",
    "Celine", "Chantal", "Penelope", "Miguel", "Mia", "Enrique", "Conchita", "Geraint",
    "Salli", "Matthew", "Kimberly", "Kendra", "Justin", "Joey", "Joanna", "Ivy",
    "Raveena", "Aditi", "Emma", "Brian", "Amy", "Russell", "Nicole", "Vicki",
    "Marlene", "Hans", "Naja", "Mads", "Gwyneth", "Zhiyu", "Tracy", "Danny",
    "Huihui", "Yaoyao", "Kangkang", "HanHan", "Zhiwei", "Asaf", "An", "Stefanos",
    "Filip", "Ivan", "Heidi", "Herena", "Kalpana", "Hemant", "Matej", "Andika",
    "Rizwan", "Lado", "Valluvar", "Linda", "Heather", "Sean", "Michael", "Karsten",
    "Guillaume", "Pattara", "Jakub", "Szabolcs", "Hoda", "Naayf",
];

/// Uniform pick from the roster. Stateless; repeats are fine.
pub fn random_voice() -> &'static str {
    VOICES[rand::thread_rng().gen_range(0..VOICES.len())]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn random_voice_comes_from_the_roster() {
        for _ in 0..32 {
            assert!(VOICES.contains(&random_voice()));
        }
    }
}
