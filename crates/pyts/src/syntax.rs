pub const KEYWORDS: &[&str] = &[
    "def", "return", "if", "elif", "else", "while", "for", "in", "True", "False", "None", "class",
    "and", "or", "not", "pass", "break", "continue",
];

/// Keywords that begin a statement; the parser resynchronizes on them.
pub const STATEMENT_KEYWORDS: &[&str] = &["def", "if", "while", "for", "return", "class"];

pub const TYPE_HINTS: &[&str] = &["int", "str", "float", "bool", "list", "dict", "tuple", "set"];

pub const SYMBOLS_2: &[([char; 2], &str)] = &[
    (['=', '='], "=="),
    (['!', '='], "!="),
    (['<', '='], "<="),
    (['>', '='], ">="),
    (['-', '>'], "->"),
    (['/', '/'], "//"),
    (['*', '*'], "**"),
    (['+', '='], "+="),
    (['-', '='], "-="),
    (['*', '='], "*="),
    (['/', '='], "/="),
    (['%', '='], "%="),
];

pub const SYMBOLS_3: &[([char; 3], &str)] = &[(['/', '/', '='], "//="), (['*', '*', '='], "**=")];

pub const OPERATORS_1: &[char] = &['+', '-', '*', '/', '%', '=', '<', '>', '!'];

pub const DELIMITERS: &[char] = &['(', ')', '[', ']', '{', '}', ',', ':', '.', ';'];

pub const AUGMENTED_ASSIGN: &[&str] = &["+=", "-=", "*=", "/=", "%=", "//=", "**="];

/// Near-miss spellings of keywords and builtins, English and Spanish.
pub const COMMON_TYPOS: &[(&str, &str)] = &[
    ("pritn", "print"),
    ("prnt", "print"),
    ("lenght", "len"),
    ("retrun", "return"),
    ("reutrn", "return"),
    ("whiel", "while"),
    ("wihle", "while"),
    ("ture", "True"),
    ("flase", "False"),
    ("fro", "for"),
    ("esle", "else"),
    ("elis", "elif"),
    ("eliif", "elif"),
    ("rnage", "range"),
    ("ragne", "range"),
    ("calss", "class"),
    ("dfe", "def"),
    ("deff", "def"),
    ("contineu", "continue"),
    ("contniue", "continue"),
    ("brak", "break"),
    ("passs", "pass"),
    ("lisst", "list"),
    ("intger", "int"),
    ("floot", "float"),
    ("strig", "str"),
    ("imprimir", "print"),
    ("imprima", "print"),
    ("mientras", "while"),
    ("retornar", "return"),
    ("retorne", "return"),
    ("definir", "def"),
    ("defina", "def"),
    ("verdadero", "True"),
    ("falso", "False"),
    ("rango", "range"),
    ("nulo", "None"),
    ("sino", "else"),
    ("longitud", "len"),
];

pub fn is_keyword(word: &str) -> bool {
    KEYWORDS.contains(&word)
}

pub fn is_type_hint(word: &str) -> bool {
    TYPE_HINTS.contains(&word)
}

pub fn typo_for(word: &str) -> Option<&'static str> {
    COMMON_TYPOS
        .iter()
        .find(|(typo, _)| *typo == word)
        .map(|(_, fix)| *fix)
}
