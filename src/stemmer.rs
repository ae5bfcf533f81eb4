/// Compact suffix-stripping stemmer for glossary search.
///
/// A reduced Porter-style pipeline: plural reduction, common derivational
/// suffixes, participle/gerund stripping, then final-`e` removal so that
/// e.g. `mate`, `mates` and `mating` all land on `mat`. Both the index and
/// the query side run the same function, so unification is what matters,
/// not linguistic exactness.
pub fn stem(word: &str) -> String {
    let mut w = word.to_lowercase();
    if w.len() <= 3 {
        return w;
    }

    // Step 1: plurals
    if w.ends_with("sses") {
        w.truncate(w.len() - 2); // classes -> class
    } else if w.ends_with("ies") && w.len() > 4 {
        w.truncate(w.len() - 3);
        w.push('y'); // assemblies -> assembly
    } else if w.ends_with('s') && !w.ends_with("ss") && !w.ends_with("us") {
        w.pop();
    }

    // Step 2: derivational suffixes
    for (suffix, replacement) in [
        ("ization", "ize"),
        ("ational", "ate"),
        ("fulness", "ful"),
        ("ousness", "ous"),
        ("iveness", "ive"),
        ("tional", "tion"),
    ] {
        if w.ends_with(suffix) && w.len() - suffix.len() >= 2 {
            w.truncate(w.len() - suffix.len());
            w.push_str(replacement);
            break;
        }
    }

    // Step 3: participles and gerunds, keeping at least three stem chars
    if w.ends_with("ing") && w.len() > 5 {
        w.truncate(w.len() - 3);
        collapse_double_consonant(&mut w);
    } else if w.ends_with("ed") && w.len() > 4 {
        w.truncate(w.len() - 2);
        collapse_double_consonant(&mut w);
    } else if w.ends_with("ly") && w.len() > 4 {
        w.truncate(w.len() - 2);
    }

    // Step 4: final e
    if w.len() > 3 && w.ends_with('e') {
        w.pop();
    }

    w
}

// fitted -> fitt -> fit; doubled l is kept (e.g. "roll")
fn collapse_double_consonant(w: &mut String) {
    let bytes = w.as_bytes();
    let n = bytes.len();
    if n >= 2 && bytes[n - 1] == bytes[n - 2] {
        let c = bytes[n - 1] as char;
        if !matches!(c, 'a' | 'e' | 'i' | 'o' | 'u' | 'l' | 's' | 'z') {
            w.pop();
        }
    }
}
