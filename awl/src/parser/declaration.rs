//! Variable declarations (`NAME : TYPE [:= INIT]`) and DB body
//! assignments (`NAME[i, j] := VALUE`).

use crate::parser::error::{ErrorKind, ParseError};
use crate::token::Token;
use crate::variable::name::{validate_ident, validate_path};
use crate::variable::{DataField, DataInit, Dimension, Ident, MAX_DIMENSIONS};

const SEMICOLON_HINT: &str = "missing semicolon in preceding lines?";

/// Minimum statement length of `x : ARRAY [ 1 .. 2 ] OF T`.
const MIN_ARRAY_TOKENS: usize = 10;

const MAX_REPEAT_COUNT: i64 = 32767;

fn malformed(message: impl Into<String>) -> ParseError {
    ParseError::new(ErrorKind::MalformedDeclaration, message)
}

/// Parse one declaration statement. With `may_have_init` unset, any `:=`
/// initializer is rejected.
pub(crate) fn parse_declaration(tokens: &[Token], may_have_init: bool) -> Result<DataField, ParseError> {
    let tokens = strip_attributes(tokens)?;

    if tokens.len() < 3 || tokens[1].text != ":" {
        return Err(malformed(format!(
            "expected 'NAME : TYPE', found '{}'",
            crate::token::join(&tokens)
        ))
        .with_note(SEMICOLON_HINT));
    }
    let name = &tokens[0].text;
    validate_ident(name)?;

    let (decl, init) = match tokens.iter().position(|t| t.text == ":=") {
        Some(pos) => (&tokens[..pos], Some(&tokens[pos + 1..])),
        None => (&tokens[..], None),
    };
    if let Some(init) = init {
        if !may_have_init {
            return Err(malformed(format!(
                "'{}' may not have an initial value in this section",
                name
            )));
        }
        if init.is_empty() {
            return Err(malformed(format!("missing initial value for '{}'", name)));
        }
    }

    let type_part = &decl[2..];
    if type_part.is_empty() {
        return Err(malformed(format!("missing type for '{}'", name)));
    }
    if type_part.iter().any(|t| t.text == ":") {
        return Err(malformed(format!("misplaced ':' in declaration of '{}'", name))
            .with_note(SEMICOLON_HINT));
    }

    if type_part.iter().any(|t| t.is("STRUCT")) {
        return Err(malformed(format!(
            "nested STRUCT in declaration of '{}' is not supported",
            name
        )));
    }

    if !type_part[0].is("ARRAY") {
        return Ok(DataField {
            ident: Ident::new(name.clone()),
            type_tokens: type_part.to_vec(),
            dimensions: None,
            inits: init
                .map(|value| {
                    vec![DataInit {
                        ident: Ident::new(name.clone()),
                        value: value.to_vec(),
                    }]
                })
                .unwrap_or_default(),
        });
    }

    if tokens.len() < MIN_ARRAY_TOKENS {
        return Err(malformed(format!("incomplete ARRAY declaration of '{}'", name)));
    }
    let (dimensions, rest) = parse_dimensions(&type_part[1..])?;
    let element_type = match rest.split_first() {
        Some((of, element_type)) if of.is("OF") && !element_type.is_empty() => element_type,
        _ => {
            return Err(malformed(format!(
                "expected 'OF TYPE' after array dimensions of '{}'",
                name
            )));
        }
    };

    let inits = match init {
        Some(value) => expand_array_init(name, &dimensions, value)?,
        None => Vec::new(),
    };

    Ok(DataField {
        ident: Ident::new(name.clone()),
        type_tokens: element_type.to_vec(),
        dimensions: Some(dimensions),
        inits,
    })
}

/// Drop `{ ... }` attribute groups.
fn strip_attributes(tokens: &[Token]) -> Result<Vec<Token>, ParseError> {
    let mut out = Vec::with_capacity(tokens.len());
    let mut in_attributes = false;
    for token in tokens {
        match token.text.as_str() {
            "{" if !in_attributes => in_attributes = true,
            "}" if in_attributes => in_attributes = false,
            _ if in_attributes => {}
            _ => out.push(token.clone()),
        }
    }
    if in_attributes {
        return Err(malformed("unterminated '{' attribute group"));
    }
    Ok(out)
}

fn parse_int(token: Option<&Token>, what: &str) -> Result<i32, ParseError> {
    token
        .and_then(|t| t.text.parse::<i32>().ok())
        .ok_or_else(|| {
            malformed(format!(
                "expected {}, found '{}'",
                what,
                token.map(|t| t.text.as_str()).unwrap_or("end of statement")
            ))
        })
}

fn expect<'t>(tokens: &'t [Token], pos: usize, text: &str) -> Result<&'t Token, ParseError> {
    match tokens.get(pos) {
        Some(t) if t.text == text => Ok(t),
        other => Err(malformed(format!(
            "expected '{}', found '{}'",
            text,
            other.map(|t| t.text.as_str()).unwrap_or("end of statement")
        ))),
    }
}

/// Parse `[ s1 .. e1 , s2 .. e2 ... ]`, returning the dimensions and the
/// tokens after the closing bracket.
fn parse_dimensions(tokens: &[Token]) -> Result<(Vec<Dimension>, &[Token]), ParseError> {
    expect(tokens, 0, "[")?;
    let mut dimensions = Vec::new();
    let mut pos = 1;
    loop {
        let start = parse_int(tokens.get(pos), "array start index")?;
        expect(tokens, pos + 1, "..")?;
        let end = parse_int(tokens.get(pos + 2), "array end index")?;
        if start > end {
            return Err(malformed(format!(
                "array start index {} is greater than end index {}",
                start, end
            )));
        }
        if dimensions.len() == MAX_DIMENSIONS {
            return Err(malformed(format!(
                "too many dimensions in array (max {})",
                MAX_DIMENSIONS
            )));
        }
        dimensions.push(Dimension { start, end });
        pos += 3;

        match tokens.get(pos).map(|t| t.text.as_str()) {
            Some(",") => pos += 1,
            Some("]") => return Ok((dimensions, &tokens[pos + 1..])),
            _ => {
                return Err(malformed("expected ',' or ']' in array dimensions"));
            }
        }
    }
}

/// Step a row-major index to the next element: the last dimension moves
/// fastest and carries into the one before it. Returns `true` when the
/// index wrapped around to the first element.
pub(crate) fn advance_index(index: &mut [i32], dimensions: &[Dimension]) -> bool {
    for (i, dim) in index.iter_mut().zip(dimensions).rev() {
        if *i < dim.end {
            *i += 1;
            return false;
        }
        *i = dim.start;
    }
    true
}

/// Writes one `DataInit` per array element, in element order.
struct ElementWriter<'a> {
    name: &'a str,
    dimensions: &'a [Dimension],
    index: Vec<i32>,
    wrapped: bool,
    inits: Vec<DataInit>,
}

impl<'a> ElementWriter<'a> {
    fn new(name: &'a str, dimensions: &'a [Dimension]) -> Self {
        ElementWriter {
            name,
            dimensions,
            index: dimensions.iter().map(|d| d.start).collect(),
            wrapped: false,
            inits: Vec::new(),
        }
    }

    fn emit(&mut self, value: Vec<Token>) {
        if self.wrapped {
            tracing::warn!(
                variable = self.name,
                "array initializer has more values than elements, wrapping around"
            );
            self.wrapped = false;
        }
        self.inits.push(DataInit {
            ident: Ident::indexed(self.name, self.index.clone()),
            value,
        });
        self.wrapped = advance_index(&mut self.index, self.dimensions);
    }
}

/// `COUNT ( v1, v2, ... )` inside an array initializer.
struct RepeatGroup {
    count: usize,
    values: Vec<Vec<Token>>,
    current: Vec<Token>,
}

impl RepeatGroup {
    fn end_value(&mut self) -> Result<(), ParseError> {
        if self.current.is_empty() {
            return Err(malformed("empty value in repeat group"));
        }
        self.values.push(std::mem::take(&mut self.current));
        Ok(())
    }
}

fn parse_repeat_count(tokens: &[Token]) -> Result<usize, ParseError> {
    let count = match tokens {
        [count] => count.text.parse::<i64>().ok(),
        _ => None,
    };
    match count {
        Some(n) if (1..=MAX_REPEAT_COUNT).contains(&n) => Ok(n as usize),
        _ => Err(malformed(format!(
            "invalid repeat count '{}' (expected 1 to {})",
            crate::token::join(tokens),
            MAX_REPEAT_COUNT
        ))),
    }
}

/// Expand the tokens after `:=` into one `DataInit` per element.
fn expand_array_init(
    name: &str,
    dimensions: &[Dimension],
    tokens: &[Token],
) -> Result<Vec<DataInit>, ParseError> {
    let mut writer = ElementWriter::new(name, dimensions);
    let mut value: Vec<Token> = Vec::new();
    let mut repeat: Option<RepeatGroup> = None;
    let mut after_group = false;

    for token in tokens {
        if let Some(group) = repeat.as_mut() {
            match token.text.as_str() {
                "(" => return Err(malformed("nested repeat groups are not allowed")),
                ")" => {
                    group.end_value()?;
                    if let Some(group) = repeat.take() {
                        for _ in 0..group.count {
                            for v in &group.values {
                                writer.emit(v.clone());
                            }
                        }
                    }
                    after_group = true;
                }
                "," => group.end_value()?,
                _ => group.current.push(token.clone()),
            }
            continue;
        }

        match token.text.as_str() {
            "(" => {
                let count = parse_repeat_count(&value)?;
                value.clear();
                repeat = Some(RepeatGroup {
                    count,
                    values: Vec::new(),
                    current: Vec::new(),
                });
            }
            ")" => return Err(malformed("unbalanced ')' in initializer")),
            "," => {
                if !value.is_empty() {
                    writer.emit(std::mem::take(&mut value));
                } else if !after_group {
                    return Err(malformed(format!("empty element in initializer of '{}'", name)));
                }
                after_group = false;
            }
            _ => {
                if after_group {
                    return Err(malformed("expected ',' after repeat group"));
                }
                value.push(token.clone());
            }
        }
    }

    if repeat.is_some() {
        return Err(malformed("unterminated repeat group"));
    }
    if !value.is_empty() {
        writer.emit(value);
    }
    Ok(writer.inits)
}

/// Parse a DB body assignment: `name := value` or `name[i, ...] := value`.
pub(crate) fn parse_db_assignment(tokens: &[Token]) -> Result<DataInit, ParseError> {
    let name = &tokens[0].text;
    let mut pos = 1;
    let mut indices = None;

    if tokens.get(pos).is_some_and(|t| t.text == "[") {
        let mut list = Vec::new();
        pos += 1;
        loop {
            list.push(parse_int(tokens.get(pos), "array index")?);
            if list.len() > MAX_DIMENSIONS {
                return Err(malformed(format!(
                    "too many dimensions in array index (max {})",
                    MAX_DIMENSIONS
                )));
            }
            pos += 1;
            match tokens.get(pos).map(|t| t.text.as_str()) {
                Some(",") => pos += 1,
                Some("]") => {
                    pos += 1;
                    break;
                }
                _ => return Err(malformed("expected ',' or ']' in array index")),
            }
        }
        indices = Some(list);
    }

    if !tokens.get(pos).is_some_and(|t| t.text == ":=") {
        return Err(ParseError::new(
            ErrorKind::UnknownStatement,
            format!(
                "expected 'NAME := VALUE' in data block, found '{}'",
                crate::token::join(tokens)
            ),
        )
        .with_note(SEMICOLON_HINT));
    }
    validate_path(name)?;

    let value = &tokens[pos + 1..];
    if value.is_empty() {
        return Err(malformed(format!("missing value for '{}'", name)));
    }

    Ok(DataInit {
        ident: Ident {
            name: name.clone(),
            indices,
        },
        value: value.to_vec(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dims(bounds: &[(i32, i32)]) -> Vec<Dimension> {
        bounds
            .iter()
            .map(|&(start, end)| Dimension { start, end })
            .collect()
    }

    #[test]
    fn index_ripple_carry() {
        let dims = dims(&[(1, 3), (1, 2)]);
        let mut index = vec![1, 1];
        let mut seen = Vec::new();
        for _ in 0..6 {
            let wrapped = advance_index(&mut index, &dims);
            seen.push((index.clone(), wrapped));
        }
        assert_eq!(
            seen,
            vec![
                (vec![1, 2], false),
                (vec![2, 1], false),
                (vec![2, 2], false),
                (vec![3, 1], false),
                (vec![3, 2], false),
                (vec![1, 1], true),
            ]
        );
    }

    #[test]
    fn index_single_dimension_with_offset() {
        let dims = dims(&[(-1, 1)]);
        let mut index = vec![-1];
        assert!(!advance_index(&mut index, &dims));
        assert_eq!(index, vec![0]);
        assert!(!advance_index(&mut index, &dims));
        assert!(advance_index(&mut index, &dims));
        assert_eq!(index, vec![-1]);
    }

    #[test]
    fn repeat_count_bounds() {
        let tok = |s: &str| vec![Token::new(s, 1, 0)];
        assert_eq!(parse_repeat_count(&tok("32767")).unwrap(), 32767);
        assert!(parse_repeat_count(&tok("0")).is_err());
        assert!(parse_repeat_count(&tok("32768")).is_err());
        assert!(parse_repeat_count(&tok("x")).is_err());
        assert!(parse_repeat_count(&[]).is_err());
    }
}
