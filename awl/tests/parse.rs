use awl::block::descriptor::DescriptorKey;
use awl::block::{Block, BlockId, BlockKind, BlockRef, InstanceBinding, VarSection};
use awl::variable::{DataField, Dimension, Ident};
use awl::{Encoding, ErrorKind, ParseError, ParseTree, Parser, ParserOptions};

fn parse(source: &str) -> ParseTree {
    Parser::new(0, "test.awl")
        .parse_text(source)
        .expect("parse failed")
}

fn parse_err(source: &str) -> ParseError {
    Parser::new(0, "test.awl")
        .parse_text(source)
        .expect_err("expected a parse error")
}

fn block<'a>(tree: &'a ParseTree, kind: BlockKind, number: u16) -> &'a Block {
    tree.get(kind, &BlockId::Number(number))
        .unwrap_or_else(|| panic!("{} {} missing", kind, number))
}

fn texts(tokens: &[awl::token::Token]) -> Vec<&str> {
    tokens.iter().map(|t| t.text.as_str()).collect()
}

fn init_values(field: &DataField) -> Vec<String> {
    field.inits.iter().map(|i| i.value_text()).collect()
}

#[test]
fn organization_block_on_one_line() {
    let tree = parse("ORGANIZATION_BLOCK OB 1 BEGIN SET; END_ORGANIZATION_BLOCK");
    assert_eq!(tree.block_count(), 1);
    let ob = block(&tree, BlockKind::Ob, 1).as_code().unwrap();
    assert_eq!(ob.instructions.len(), 1);
    assert_eq!(ob.instructions[0].name, "SET");
    assert!(ob.instructions[0].operands.is_empty());
    assert_eq!(ob.instructions[0].label, None);
    assert!(tree.current().is_none());
}

#[test]
fn organization_block_with_networks_labels_and_calls() {
    let source = "\
ORGANIZATION_BLOCK OB 1
TITLE = Main cycle
VERSION : 0.1

BEGIN
NETWORK
TITLE = first network
      U     E 0.0;
M001: =     A 4.0;
      CALL FC 1 (
           IN := MW 10, // input
           OUT := MW 12);
END_ORGANIZATION_BLOCK
";
    let tree = parse(source);
    let ob = block(&tree, BlockKind::Ob, 1);
    assert_eq!(ob.descriptors().get(DescriptorKey::Title), Some("Main cycle"));
    assert_eq!(ob.descriptors().get(DescriptorKey::Version), Some("0.1"));

    let insns = &ob.as_code().unwrap().instructions;
    assert_eq!(insns.len(), 3);

    assert_eq!(insns[0].name, "U");
    assert_eq!(insns[0].operand_texts(), vec!["E", "0.0"]);
    assert_eq!(insns[0].line, 8);

    assert_eq!(insns[1].label.as_deref(), Some("M001"));
    assert_eq!(insns[1].name, "=");
    assert_eq!(insns[1].operand_texts(), vec!["A", "4.0"]);

    assert_eq!(insns[2].name, "CALL");
    assert_eq!(
        insns[2].operand_texts(),
        vec!["FC", "1", "(", "IN", ":=", "MW", "10", ",", "OUT", ":=", "MW", "12", ")"]
    );
    assert_eq!(insns[2].line, 10);
    assert_eq!(
        insns[2].block,
        BlockRef {
            kind: BlockKind::Ob,
            id: BlockId::Number(1)
        }
    );
    assert!(tree.instruction_block(&insns[2]).is_some());
}

#[test]
fn data_block_on_one_line() {
    let tree = parse("DATA_BLOCK DB 1 STRUCT x : INT := 5; END_STRUCT BEGIN END_DATA_BLOCK");
    let db = block(&tree, BlockKind::Db, 1).as_db().unwrap();
    assert_eq!(db.fields.len(), 1);
    let x = &db.fields[0];
    assert_eq!(x.ident, Ident::new("x"));
    assert_eq!(texts(&x.type_tokens), vec!["INT"]);
    assert!(!x.is_array());
    assert_eq!(x.inits.len(), 1);
    assert_eq!(x.inits[0].ident, Ident::new("x"));
    assert_eq!(texts(&x.inits[0].value), vec!["5"]);
}

#[test]
fn data_block_arrays_and_strings() {
    let source = "\
DATA_BLOCK DB 2
STRUCT
  arr : ARRAY [1..8] OF INT := 4 (1, 2);
  grid : ARRAY [1..3, 1..2] OF BYTE := 1, 2, 3;
  s : STRING [20] := 'abc';
  mixed : ARRAY [1..5] OF INT := 2 (7), 9, 2 (0);
END_STRUCT
BEGIN
END_DATA_BLOCK
";
    let tree = parse(source);
    let db = block(&tree, BlockKind::Db, 2).as_db().unwrap();
    assert_eq!(db.fields.len(), 4);

    let arr = &db.fields[0];
    assert_eq!(arr.dimensions, Some(vec![Dimension { start: 1, end: 8 }]));
    assert_eq!(arr.element_count(), 8);
    assert_eq!(texts(&arr.type_tokens), vec!["INT"]);
    assert_eq!(init_values(arr), vec!["1", "2", "1", "2", "1", "2", "1", "2"]);
    let indices: Vec<_> = arr.inits.iter().map(|i| i.ident.indices.clone().unwrap()).collect();
    assert_eq!(indices, (1..=8).map(|i| vec![i]).collect::<Vec<_>>());

    let grid = &db.fields[1];
    assert_eq!(grid.element_count(), 6);
    assert_eq!(
        grid.inits.iter().map(|i| i.ident.to_string()).collect::<Vec<_>>(),
        vec!["grid[1,1]", "grid[1,2]", "grid[2,1]"]
    );

    let s = &db.fields[2];
    assert_eq!(texts(&s.type_tokens), vec!["STRING", "[", "20", "]"]);
    assert_eq!(init_values(s), vec!["'abc'"]);

    assert_eq!(init_values(&db.fields[3]), vec!["7", "7", "9", "0", "0"]);
}

#[test]
fn array_initializer_wraps_after_last_element() {
    let tree = parse(
        "DATA_BLOCK DB 1\nSTRUCT\n a : ARRAY [1..2] OF INT := 1, 2, 3;\nEND_STRUCT\nBEGIN\nEND_DATA_BLOCK\n",
    );
    let a = &block(&tree, BlockKind::Db, 1).as_db().unwrap().fields[0];
    assert_eq!(
        a.inits.iter().map(|i| i.ident.to_string()).collect::<Vec<_>>(),
        vec!["a[1]", "a[2]", "a[1]"]
    );
}

#[test]
fn data_block_body_assignments_and_instance() {
    let source = "\
DATA_BLOCK \"Settings\"
TITLE = Settings
FB 10
BEGIN
   speed := 100;
   table[1, 2] := 7;
   rec.limit := L#5;
END_DATA_BLOCK
";
    let tree = parse(source);
    let db = tree
        .get(BlockKind::Db, &BlockId::Symbol("Settings".into()))
        .and_then(Block::as_db)
        .unwrap();
    assert_eq!(db.instance_of, Some(InstanceBinding::Fb(BlockId::Number(10))));
    assert_eq!(db.field_inits.len(), 3);
    assert_eq!(db.field_inits[0].ident, Ident::new("speed"));
    assert_eq!(db.field_inits[0].value_text(), "100");
    assert_eq!(db.field_inits[1].ident, Ident::indexed("table", vec![1, 2]));
    assert_eq!(db.field_inits[1].value_text(), "7");
    assert_eq!(db.field_inits[2].ident.name, "rec.limit");
}

#[test]
fn system_function_block_instance() {
    let tree = parse("DATA_BLOCK DB 5\nSFB 4\nBEGIN\nEND_DATA_BLOCK\n");
    let db = block(&tree, BlockKind::Db, 5).as_db().unwrap();
    assert_eq!(db.instance_of, Some(InstanceBinding::Sfb(4)));
}

#[test]
fn function_block_sections() {
    let source = "\
FUNCTION_BLOCK FB 7
TITLE = Motor
{ S7_m_c := 'true' }
AUTHOR : me
VAR_INPUT
  start : BOOL;
  speed { S7_m_c := 'true' } : INT;
END_VAR
VAR_OUTPUT
  running : BOOL;
END_VAR
VAR
  count : INT := 0;
END_VAR
VAR_TEMP
  t : DWORD;
END_VAR
BEGIN
  U #start;
  = #running;
END_FUNCTION_BLOCK
";
    let tree = parse(source);
    let fb = block(&tree, BlockKind::Fb, 7);
    assert_eq!(fb.descriptors().get(DescriptorKey::Author), Some("me"));
    let code = fb.as_code().unwrap();
    assert_eq!(
        code.inputs.iter().map(|f| f.ident.name.as_str()).collect::<Vec<_>>(),
        vec!["start", "speed"]
    );
    assert_eq!(code.section(VarSection::Output).len(), 1);
    assert_eq!(code.section(VarSection::Static).len(), 1);
    assert_eq!(init_values(&code.section(VarSection::Static)[0]), vec!["0"]);
    assert_eq!(code.section(VarSection::Temp)[0].ident.name, "t");
    assert!(code.section(VarSection::InOut).is_empty());
    assert_eq!(code.instructions.len(), 2);
    assert_eq!(code.instructions[1].name, "=");
    assert_eq!(code.return_type, None);
}

#[test]
fn function_with_return_type() {
    let source = "\
FUNCTION FC 3 : INT
VAR_INPUT
  a : INT;
END_VAR
BEGIN
  L #a;
  T #RET_VAL;
END_FUNCTION
";
    let tree = parse(source);
    let fc = block(&tree, BlockKind::Fc, 3).as_code().unwrap();
    assert_eq!(texts(fc.return_type.as_deref().unwrap()), vec!["INT"]);
    assert_eq!(fc.inputs.len(), 1);
    assert_eq!(fc.instructions.len(), 2);
}

#[test]
fn function_requires_return_type() {
    let err = parse_err("FUNCTION FC 3\nBEGIN\nEND_FUNCTION\n");
    assert_eq!(err.kind, ErrorKind::MalformedDeclaration);
    assert_eq!(err.line, 1);
}

#[test]
fn function_rejects_static_section() {
    let err = parse_err("FUNCTION FC 1 : VOID\nVAR\n x : INT;\nEND_VAR\nBEGIN\nEND_FUNCTION\n");
    assert_eq!(err.kind, ErrorKind::UnknownStatement);
    assert_eq!(err.line, 2);
}

#[test]
fn user_defined_type() {
    let source = "\
TYPE UDT 5
STRUCT
  a : INT;
  b : ARRAY [0..1] OF BOOL;
END_STRUCT
END_TYPE
";
    let tree = parse(source);
    let udt = block(&tree, BlockKind::Udt, 5).as_udt().unwrap();
    assert_eq!(udt.fields.len(), 2);
    assert_eq!(udt.fields[1].dimensions, Some(vec![Dimension { start: 0, end: 1 }]));
}

#[test]
fn multi_line_attributes_are_skipped() {
    let source = "\
FUNCTION_BLOCK FB 2
{ S7_a := 'x';
  S7_b := 'y' }
BEGIN
NOP 0
END_FUNCTION_BLOCK
";
    let tree = parse(source);
    assert_eq!(block(&tree, BlockKind::Fb, 2).as_code().unwrap().instructions.len(), 1);
}

#[test]
fn blocks_of_all_kinds_coexist() {
    let source = "\
TYPE UDT 1
STRUCT
 a : INT;
END_STRUCT
END_TYPE
DATA_BLOCK DB1
STRUCT
 a : INT;
END_STRUCT
BEGIN
END_DATA_BLOCK
FUNCTION_BLOCK FB1
BEGIN
END_FUNCTION_BLOCK
ORGANIZATION_BLOCK OB1
BEGIN
END_ORGANIZATION_BLOCK
";
    let tree = parse(source);
    assert_eq!(tree.block_count(), 4);
    let kinds: Vec<_> = tree.iter().map(Block::kind).collect();
    assert_eq!(
        kinds,
        vec![BlockKind::Ob, BlockKind::Fb, BlockKind::Db, BlockKind::Udt]
    );
    assert!(tree.blocks(BlockKind::Fc).is_empty());
}

#[test]
fn duplicate_descriptor() {
    let err = parse_err(
        "DATA_BLOCK DB 3\nTITLE = \"Hello\"\nTITLE = \"Hello\"\nSTRUCT\n a : INT;\nEND_STRUCT\nBEGIN\nEND_DATA_BLOCK\n",
    );
    assert_eq!(err.kind, ErrorKind::DuplicateDescriptor);
    assert_eq!(err.line, 3);
    assert_eq!(
        err.to_string(),
        "test.awl:3: duplicate descriptor: TITLE is already set for DB 3"
    );
}

#[test]
fn duplicate_instance_binding() {
    let err = parse_err("DATA_BLOCK DB 5\nFB 1\nFB 2\nBEGIN\nEND_DATA_BLOCK\n");
    assert_eq!(err.kind, ErrorKind::DuplicateDescriptor);
    assert_eq!(err.line, 3);
}

#[test]
fn duplicate_block() {
    let source = "\
FUNCTION_BLOCK FB 7
BEGIN
END_FUNCTION_BLOCK
FUNCTION_BLOCK FB 7
BEGIN
END_FUNCTION_BLOCK
";
    let err = parse_err(source);
    assert_eq!(err.kind, ErrorKind::DuplicateBlock);
    assert_eq!(err.line, 4);
    assert!(err.message.contains("FB 7"));
}

#[test]
fn too_many_dimensions() {
    let err = parse_err(
        "DATA_BLOCK DB 1\nSTRUCT\n a : ARRAY [1..2, 1..2, 1..2, 1..2, 1..2, 1..2, 1..2] OF INT;\nEND_STRUCT\nBEGIN\nEND_DATA_BLOCK\n",
    );
    assert_eq!(err.kind, ErrorKind::MalformedDeclaration);
    assert!(err.message.contains("too many dimensions"));
    assert_eq!(err.line, 3);
}

#[test]
fn six_dimensions_are_accepted() {
    let tree = parse(
        "DATA_BLOCK DB 1\nSTRUCT\n a : ARRAY [1..2, 1..2, 1..2, 1..2, 1..2, 1..2] OF INT;\nEND_STRUCT\nBEGIN\nEND_DATA_BLOCK\n",
    );
    let a = &block(&tree, BlockKind::Db, 1).as_db().unwrap().fields[0];
    assert_eq!(a.element_count(), 64);
}

#[test]
fn full_range_bounds_do_not_overflow() {
    let tree = parse(
        "DATA_BLOCK DB 1\nSTRUCT\n a : ARRAY [-2147483648..2147483647] OF INT := 1, 2;\n \
         b : ARRAY [-2147483648..2147483647, -2147483648..2147483647, -2147483648..2147483647] OF INT;\n\
         END_STRUCT\nBEGIN\nEND_DATA_BLOCK\n",
    );
    let db = block(&tree, BlockKind::Db, 1).as_db().unwrap();

    let a = &db.fields[0];
    let dim = a.dimensions.as_ref().unwrap()[0];
    assert_eq!(dim.len(), 1u64 << 32);
    assert_eq!(a.element_count(), usize::try_from(1u64 << 32).unwrap_or(usize::MAX));
    assert_eq!(
        a.inits.iter().map(|i| i.ident.to_string()).collect::<Vec<_>>(),
        vec!["a[-2147483648]", "a[-2147483647]"]
    );

    // 2^96 elements cannot be counted in a usize.
    assert_eq!(db.fields[1].element_count(), usize::MAX);
}

#[test]
fn dimension_start_after_end() {
    let err = parse_err("DATA_BLOCK DB 1\nSTRUCT\n a : ARRAY [3..1] OF INT;\nEND_STRUCT\nBEGIN\nEND_DATA_BLOCK\n");
    assert_eq!(err.kind, ErrorKind::MalformedDeclaration);
}

#[test]
fn unterminated_quote_reports_last_line() {
    let err = parse_err("ORGANIZATION_BLOCK OB 1\nBEGIN\nL \"abc;\nEND_ORGANIZATION_BLOCK");
    assert_eq!(err.kind, ErrorKind::UnterminatedQuote);
    assert_eq!(err.line, 4);
}

#[test]
fn unterminated_parenthesis() {
    let err = parse_err("ORGANIZATION_BLOCK OB 1\nBEGIN\nCALL FC 1 (A := 1\nEND_ORGANIZATION_BLOCK");
    assert_eq!(err.kind, ErrorKind::UnterminatedParenthesis);
}

#[test]
fn repeat_group_errors() {
    let decl = |init: &str| {
        format!(
            "DATA_BLOCK DB 1\nSTRUCT\n a : ARRAY [1..4] OF INT := {};\nEND_STRUCT\nBEGIN\nEND_DATA_BLOCK\n",
            init
        )
    };
    for init in ["0 (1)", "40000 (1)", "x (1)", "2 (2 (1))", "2 ()"] {
        let err = parse_err(&decl(init));
        assert_eq!(err.kind, ErrorKind::MalformedDeclaration, "{}", init);
    }
}

#[test]
fn initializer_not_allowed_in_input_section() {
    let err = parse_err(
        "FUNCTION_BLOCK FB 1\nVAR_INPUT\n a : INT := 1;\nEND_VAR\nBEGIN\nEND_FUNCTION_BLOCK\n",
    );
    assert_eq!(err.kind, ErrorKind::MalformedDeclaration);
    assert_eq!(err.line, 3);
}

#[test]
fn missing_colon_hints_at_semicolon() {
    let err = parse_err("DATA_BLOCK DB 1\nSTRUCT\n a INT;\nEND_STRUCT\nBEGIN\nEND_DATA_BLOCK\n");
    assert_eq!(err.kind, ErrorKind::MalformedDeclaration);
    assert!(err.notes.iter().any(|n| n.contains("missing semicolon")));

    let err = parse_err("DATA_BLOCK DB 1\nSTRUCT\n a : INT\n b : INT;\nEND_STRUCT\nBEGIN\nEND_DATA_BLOCK\n");
    assert_eq!(err.kind, ErrorKind::MalformedDeclaration);
    assert_eq!(err.line, 3);
}

#[test]
fn invalid_variable_name() {
    let err = parse_err("DATA_BLOCK DB 1\nSTRUCT\n 1abc : INT;\nEND_STRUCT\nBEGIN\nEND_DATA_BLOCK\n");
    assert_eq!(err.kind, ErrorKind::InvalidIdentifier);
}

#[test]
fn invalid_labels() {
    let err = parse_err("ORGANIZATION_BLOCK OB 1\nBEGIN\nLABEL5: NOP 0\nEND_ORGANIZATION_BLOCK\n");
    assert_eq!(err.kind, ErrorKind::InvalidIdentifier);
    assert_eq!(err.line, 3);

    let err = parse_err("ORGANIZATION_BLOCK OB 1\nBEGIN\nM1:\nEND_ORGANIZATION_BLOCK\n");
    assert_eq!(err.kind, ErrorKind::UnknownStatement);
}

#[test]
fn db_index_list_is_limited() {
    let err = parse_err("DATA_BLOCK DB 1\nSTRUCT\n a : INT;\nEND_STRUCT\nBEGIN\n x[1,2,3,4,5,6,7] := 1;\nEND_DATA_BLOCK\n");
    assert_eq!(err.kind, ErrorKind::MalformedDeclaration);
}

#[test]
fn nested_struct_is_rejected() {
    let err = parse_err("DATA_BLOCK DB 1\nSTRUCT\n inner : STRUCT;\n a : INT;\n END_STRUCT;\nEND_STRUCT\nBEGIN\nEND_DATA_BLOCK\n");
    assert_eq!(err.kind, ErrorKind::MalformedDeclaration);
    assert_eq!(err.line, 3);
}

#[test]
fn db_body_rejects_instructions() {
    let err = parse_err("DATA_BLOCK DB 1\nSTRUCT\n a : INT;\nEND_STRUCT\nBEGIN\n L 5;\nEND_DATA_BLOCK\n");
    assert_eq!(err.kind, ErrorKind::UnknownStatement);
    assert_eq!(err.line, 6);
}

#[test]
fn unknown_statements() {
    let err = parse_err("ORGANIZATION_BLOCK OB 1\nBEGIN\nEND_ORGANIZATION_BLOCK\nFOO BAR\n");
    assert_eq!(err.kind, ErrorKind::UnknownStatement);
    assert_eq!(err.line, 4);

    let err = parse_err("FUNCTION_BLOCK FB 1\nGARBAGE\nBEGIN\nEND_FUNCTION_BLOCK\n");
    assert_eq!(err.kind, ErrorKind::UnknownStatement);
    assert!(err.message.contains("missing semicolon in preceding lines?"));

    let err = parse_err("ORGANIZATION_BLOCK OB 1\nBEGIN\nEND_FUNCTION\n");
    assert_eq!(err.kind, ErrorKind::UnknownStatement);
}

#[test]
fn flat_layout_ignores_quoted_keywords() {
    let tree = parse("CALL \"TYPE\"\nL 'FUNCTION'\nSET\n");
    assert_eq!(tree.block_count(), 1);
    let ob = block(&tree, BlockKind::Ob, 1).as_code().unwrap();
    assert_eq!(ob.instructions.len(), 3);
    assert_eq!(texts(&ob.instructions[0].operands), vec!["\"TYPE\""]);
    assert_eq!(texts(&ob.instructions[1].operands), vec!["'FUNCTION'"]);

    // A keyword after a closed quote still selects the block layout.
    let err = parse_err("L 'x' // DATA_BLOCK\nL \"a\" FUNCTION_BLOCK\n");
    assert_eq!(err.kind, ErrorKind::UnknownStatement);
    assert_eq!(err.line, 1);
}

#[test]
fn colon_descriptors_keep_value_verbatim() {
    let tree = parse("FUNCTION_BLOCK FB 3\nNAME : a:b\nFAMILY:x  y\nBEGIN\nEND_FUNCTION_BLOCK\n");
    let fb = block(&tree, BlockKind::Fb, 3);
    assert_eq!(fb.descriptors().get(DescriptorKey::Name), Some("a:b"));
    assert_eq!(fb.descriptors().get(DescriptorKey::Family), Some("x  y"));
}

#[test]
fn header_flags_are_ignored() {
    let source = "\
FUNCTION_BLOCK FB 2
TITLE = Flags
KNOW_HOW_PROTECT
STANDARD
VAR_INPUT
  x : BOOL;
END_VAR
BEGIN
  U #x;
END_FUNCTION_BLOCK
";
    let tree = parse(source);
    assert_eq!(tree.block_count(), 1);
    let fb = block(&tree, BlockKind::Fb, 2);
    assert_eq!(fb.descriptors().get(DescriptorKey::Title), Some("Flags"));
    assert_eq!(fb.descriptors().iter().count(), 1);
    let code = fb.as_code().unwrap();
    assert_eq!(code.section(VarSection::Input).len(), 1);
    assert_eq!(code.instructions.len(), 1);
    assert_eq!(code.instructions[0].name, "U");
    assert_eq!(texts(&code.instructions[0].operands), vec!["#x"]);
}

#[test]
fn flat_layout_uses_implicit_ob1() {
    let tree = parse("L 5\nT MW 10 // store\n");
    assert_eq!(tree.block_count(), 1);
    let ob = block(&tree, BlockKind::Ob, 1).as_code().unwrap();
    assert_eq!(ob.instructions.len(), 2);
    assert_eq!(ob.instructions[1].operand_texts(), vec!["MW", "10"]);
    assert_eq!(ob.instructions[1].line, 2);
}

#[test]
fn unterminated_block_is_lenient_by_default() {
    let source = "ORGANIZATION_BLOCK OB 1\nBEGIN\nSET\n";
    let tree = parse(source);
    assert_eq!(block(&tree, BlockKind::Ob, 1).as_code().unwrap().instructions.len(), 1);

    let strict = ParserOptions {
        require_block_end: true,
        ..ParserOptions::default()
    };
    let err = Parser::new(0, "test.awl")
        .with_options(strict)
        .parse_text(source)
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::UnterminatedBlock);
    assert!(err.message.contains("OB 1"));
}

#[test]
fn errors_carry_source_metadata() {
    let err = Parser::new(3, "plant.awl")
        .parse_text("ORGANIZATION_BLOCK OB 1\nBEGIN\nEND_ORGANIZATION_BLOCK\nORGANIZATION_BLOCK OB 1\n")
        .unwrap_err();
    assert_eq!(err.source_id, 3);
    assert_eq!(err.source_name, "plant.awl");
    assert!(err.to_string().starts_with("plant.awl:4:"));
    assert!(err.span.is_some());
}

#[test]
fn raw_bytes_are_decoded() {
    let source = b"ORGANIZATION_BLOCK OB 1\nTITLE = Gr\xf6\xdfe\nBEGIN\nEND_ORGANIZATION_BLOCK\n";
    let tree = Parser::new(0, "latin1.awl").parse(source).unwrap();
    assert_eq!(
        block(&tree, BlockKind::Ob, 1).descriptors().get(DescriptorKey::Title),
        Some("Gr\u{f6}\u{df}e")
    );

    let utf8 = ParserOptions {
        encoding: Encoding::Utf8,
        ..ParserOptions::default()
    };
    let err = Parser::new(0, "latin1.awl")
        .with_options(utf8)
        .parse(source)
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Encoding);
    assert_eq!(err.line, 2);
    assert_eq!(err.source_name, "latin1.awl");
}
