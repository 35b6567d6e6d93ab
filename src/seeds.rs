//! Built-in content that keeps the letter game usable without a letters file.

use crate::dataset::Dataset;
use crate::domain::{Category, CategoryEntry, DatasetKind};

// letter, spoken name, IPA, example words
const ALPHABET: [(&str, &str, &str, [&str; 2]); 26] = [
  ("A", "ei", "/eɪ/", ["apple", "ant"]),
  ("B", "bee", "/biː/", ["ball", "bear"]),
  ("C", "see", "/siː/", ["cat", "car"]),
  ("D", "dee", "/diː/", ["dog", "duck"]),
  ("E", "ee", "/iː/", ["egg", "elephant"]),
  ("F", "ef", "/ɛf/", ["fish", "frog"]),
  ("G", "jee", "/dʒiː/", ["goat", "grape"]),
  ("H", "aitch", "/eɪtʃ/", ["hat", "horse"]),
  ("I", "eye", "/aɪ/", ["ice", "igloo"]),
  ("J", "jay", "/dʒeɪ/", ["juice", "jam"]),
  ("K", "kay", "/keɪ/", ["kite", "king"]),
  ("L", "el", "/ɛl/", ["lion", "lemon"]),
  ("M", "em", "/ɛm/", ["moon", "monkey"]),
  ("N", "en", "/ɛn/", ["nest", "nose"]),
  ("O", "oh", "/oʊ/", ["orange", "owl"]),
  ("P", "pee", "/piː/", ["pig", "pen"]),
  ("Q", "cue", "/kjuː/", ["queen", "quilt"]),
  ("R", "ar", "/ɑːr/", ["rabbit", "rain"]),
  ("S", "es", "/ɛs/", ["sun", "snake"]),
  ("T", "tee", "/tiː/", ["tiger", "tree"]),
  ("U", "you", "/juː/", ["umbrella", "up"]),
  ("V", "vee", "/viː/", ["van", "violin"]),
  ("W", "double-u", "/ˈdʌbəl.juː/", ["water", "whale"]),
  ("X", "ex", "/ɛks/", ["box", "fox"]),
  ("Y", "why", "/waɪ/", ["yak", "yellow"]),
  ("Z", "zee", "/ziː/", ["zebra", "zoo"]),
];

const VOWELS: [&str; 5] = ["A", "E", "I", "O", "U"];

fn letter_entry((letter, name, ipa, words): &(&str, &str, &str, [&str; 2])) -> CategoryEntry {
  CategoryEntry {
    symbol: letter.to_string(),
    pronunciation: name.to_string(),
    phonetic: Some(ipa.to_string()),
    meaning: words[0].to_string(),
    native_meaning: None,
    example_words: words.iter().map(|w| w.to_string()).collect(),
    image_file: None,
  }
}

/// The 26-letter alphabet split into vowels and consonants.
pub fn alphabet_dataset() -> Dataset {
  let (vowels, consonants): (Vec<_>, Vec<_>) = ALPHABET.iter().partition(|row| VOWELS.contains(&row.0));
  Dataset {
    kind: DatasetKind::Letters,
    categories: vec![
      Category { name: "Vowels".into(), entries: vowels.into_iter().map(letter_entry).collect() },
      Category { name: "Consonants".into(), entries: consonants.into_iter().map(letter_entry).collect() },
    ],
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn alphabet_has_every_letter_once() {
    let ds = alphabet_dataset();
    assert_eq!(ds.entry_count(), 26);
    assert_eq!(ds.category("Vowels").map(|c| c.entries.len()), Some(5));
    let letters: String = ALPHABET.iter().map(|r| r.0).collect();
    assert_eq!(letters, "ABCDEFGHIJKLMNOPQRSTUVWXYZ");
  }
}
