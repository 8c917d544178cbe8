//! Platform-independent key representation

use serde::{Deserialize, Serialize};

/// Binary operator keys
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operator {
    Add,
    Subtract,
    Multiply,
    Divide,
    Power,
}

impl Operator {
    /// Symbol written into the expression buffer
    pub fn symbol(&self) -> char {
        match self {
            Operator::Add => '+',
            Operator::Subtract => '-',
            Operator::Multiply => '×',
            Operator::Divide => '÷',
            Operator::Power => '^',
        }
    }

    /// Accepts both the display symbols and their ASCII aliases
    pub fn from_char(ch: char) -> Option<Self> {
        match ch {
            '+' => Some(Operator::Add),
            '-' | '−' => Some(Operator::Subtract),
            '×' | '*' | 'x' => Some(Operator::Multiply),
            '÷' | '/' => Some(Operator::Divide),
            '^' => Some(Operator::Power),
            _ => None,
        }
    }

    /// True for characters that act as binary operators in the buffer
    pub fn is_operator_char(ch: char) -> bool {
        matches!(ch, '+' | '-' | '×' | '÷' | '^')
    }
}

/// Parenthesis keys
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Paren {
    Open,
    Close,
}

/// Function keys
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Function {
    Sqrt,
    Percent,
    Fraction,
    Root,
    MemoryRecall,
    MemoryClear,
    MemoryAdd,
    MemorySub,
    Tax,
    TaxPlus,
    Markup,
    GrandTotal,
    Round,
    PlusMinus,
}

/// Editing and evaluation controls
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Control {
    ClearEntry,
    ClearAll,
    Delete,
    Equals,
}

/// Arrow keys
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Left,
    Right,
    Up,
    Down,
}

/// Explicit mode entry (long press or a dedicated key)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModeRequest {
    TaxRate,
    Markup,
    Fraction,
}

/// Platform-independent key event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Key {
    /// Single digit, always in `0..=9`
    Digit(u8),
    DoubleZero,
    Decimal,
    Operator(Operator),
    Paren(Paren),
    Function(Function),
    Control(Control),
    Navigate(Direction),
    EnterMode(ModeRequest),
}

impl Key {
    /// Digit key, `None` for values above 9
    pub fn digit(d: u8) -> Option<Self> {
        (d <= 9).then_some(Key::Digit(d))
    }

    /// Convert a typed character to a Key
    pub fn from_char(ch: char) -> Option<Self> {
        match ch {
            '0'..='9' => Key::digit(ch as u8 - b'0'),
            '.' | ',' => Some(Key::Decimal),
            '(' => Some(Key::Paren(Paren::Open)),
            ')' => Some(Key::Paren(Paren::Close)),
            '=' | '\r' | '\n' => Some(Key::Control(Control::Equals)),
            '\x08' | '\x7f' => Some(Key::Control(Control::Delete)),
            '\x1b' => Some(Key::Control(Control::ClearAll)),
            '%' => Some(Key::Function(Function::Percent)),
            '√' => Some(Key::Function(Function::Sqrt)),
            ch => Operator::from_char(ch).map(Key::Operator),
        }
    }

    /// Convert a button name (as printed on the keypad) to a Key
    pub fn from_name(name: &str) -> Option<Self> {
        let lower = name.trim().to_ascii_lowercase();
        let key = match lower.as_str() {
            "00" => Key::DoubleZero,
            "sqrt" => Key::Function(Function::Sqrt),
            "percent" => Key::Function(Function::Percent),
            "frac" | "fraction" => Key::Function(Function::Fraction),
            "root" => Key::Function(Function::Root),
            "mr" | "rm" => Key::Function(Function::MemoryRecall),
            "mc" | "cm" => Key::Function(Function::MemoryClear),
            "m+" => Key::Function(Function::MemoryAdd),
            "m-" => Key::Function(Function::MemorySub),
            "tax" | "tax-" => Key::Function(Function::Tax),
            "tax+" => Key::Function(Function::TaxPlus),
            "mu" | "markup" => Key::Function(Function::Markup),
            "gt" => Key::Function(Function::GrandTotal),
            "rv" | "round" => Key::Function(Function::Round),
            "+/-" | "neg" => Key::Function(Function::PlusMinus),
            "ce" => Key::Control(Control::ClearEntry),
            "ac" | "c" | "on" | "escape" | "esc" => Key::Control(Control::ClearAll),
            "del" | "backspace" | "back" => Key::Control(Control::Delete),
            "enter" | "equals" => Key::Control(Control::Equals),
            "left" => Key::Navigate(Direction::Left),
            "right" => Key::Navigate(Direction::Right),
            "up" => Key::Navigate(Direction::Up),
            "down" => Key::Navigate(Direction::Down),
            "set-tax" | "taxrate" => Key::EnterMode(ModeRequest::TaxRate),
            "set-mu" => Key::EnterMode(ModeRequest::Markup),
            "set-frac" => Key::EnterMode(ModeRequest::Fraction),
            _ => {
                let mut chars = lower.chars();
                return match (chars.next(), chars.next()) {
                    (Some(ch), None) => Key::from_char(ch),
                    _ => None,
                };
            }
        };
        Some(key)
    }

    /// Text a key contributes to an expression, if it is a text key
    pub fn text(&self) -> Option<&'static str> {
        const DIGITS: [&str; 10] = ["0", "1", "2", "3", "4", "5", "6", "7", "8", "9"];
        match self {
            Key::Digit(d) => DIGITS.get(*d as usize).copied(),
            Key::DoubleZero => Some("00"),
            Key::Decimal => Some("."),
            Key::Operator(Operator::Add) => Some("+"),
            Key::Operator(Operator::Subtract) => Some("-"),
            Key::Operator(Operator::Multiply) => Some("×"),
            Key::Operator(Operator::Divide) => Some("÷"),
            Key::Operator(Operator::Power) => Some("^"),
            Key::Paren(Paren::Open) => Some("("),
            Key::Paren(Paren::Close) => Some(")"),
            _ => None,
        }
    }
}
