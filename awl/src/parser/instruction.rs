use crate::block::BlockRef;
use crate::instruction::Instruction;
use crate::parser::error::{ErrorKind, ParseError};
use crate::parser::tokenizer::Statement;
use crate::variable::name::validate_label;

/// Split a body statement into label, mnemonic and raw operands.
pub(crate) fn parse_instruction(
    statement: Statement,
    source_id: usize,
    block: BlockRef,
) -> Result<Instruction, ParseError> {
    let line = statement.line();
    let mut tokens = statement.tokens.into_iter();
    let Some(first) = tokens.next() else {
        return Err(ParseError::new(ErrorKind::UnknownStatement, "empty instruction"));
    };

    let (label, name) = match first.text.strip_suffix(':').map(str::to_string) {
        Some(label) => {
            validate_label(&label)?;
            let Some(name) = tokens.next() else {
                return Err(ParseError::new(
                    ErrorKind::UnknownStatement,
                    format!("label '{}' is not followed by an instruction", label),
                ));
            };
            (Some(label), name)
        }
        None => (None, first),
    };

    Ok(Instruction {
        label,
        name: name.text,
        operands: tokens.collect(),
        source_id,
        line,
        block,
    })
}
