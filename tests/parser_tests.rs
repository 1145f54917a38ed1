// Integration tests for the Sprig parser

use sprig::parser::ast::{LexemeIndex, ParseTree, Symbol, ERROR_NODE, ROOT_NODE};
use sprig::parser::lexer::Terminal;
use sprig::parser::parse;

fn texts(tree: &ParseTree, source: &[u8], lexemes: &[LexemeIndex]) -> Vec<String> {
    lexemes
        .iter()
        .map(|&lexi| tree.lexeme_text(source, lexi).into_owned())
        .collect()
}

fn first_expr(tree: &ParseTree) -> usize {
    let decl = tree.as_module(ROOT_NODE).decls[0];
    tree.as_vardecl(decl).exprs[0]
}

#[test]
fn test_precedence_and_associativity() {
    let tree = parse(b"let a = 1+1+1*1;").expect("parse failed");

    assert!(tree.diagnostics.is_empty());
    assert_eq!(
        tree.symbols(),
        vec![
            Symbol::Module,
            Symbol::VarDecl,
            Symbol::Add,
            Symbol::Add,
            Symbol::LiteralInt,
            Symbol::LiteralInt,
            Symbol::Mul,
            Symbol::LiteralInt,
            Symbol::LiteralInt,
        ]
    );
}

#[test]
fn test_identifier_list() {
    let source = b"let a,b,c = 1;";
    let tree = parse(source).expect("parse failed");

    assert!(tree.diagnostics.is_empty());
    let decl = tree.as_module(ROOT_NODE).decls[0];
    let view = tree.as_vardecl(decl);
    assert_eq!(texts(&tree, source, view.identifiers), vec!["a", "b", "c"]);
    assert_eq!(view.exprs.len(), 1);
    assert!(!view.is_public);
}

#[test]
fn test_name_path() {
    let source = b"let a = space::subspace::config.pos.x;";
    let tree = parse(source).expect("parse failed");

    assert!(tree.diagnostics.is_empty());
    let name = tree.as_name(first_expr(&tree));
    assert_eq!(texts(&tree, source, name.namespaces), vec!["space", "subspace"]);
    assert_eq!(texts(&tree, source, name.fields), vec!["config", "pos", "x"]);
    assert!(!name.implicit_this);
}

#[test]
fn test_implicit_this() {
    let source = b"let a = .pos.x;";
    let tree = parse(source).expect("parse failed");

    assert!(tree.diagnostics.is_empty());
    let name = tree.as_name(first_expr(&tree));
    assert!(name.implicit_this);
    assert!(name.namespaces.is_empty());
    assert_eq!(texts(&tree, source, name.fields), vec!["pos", "x"]);
}

#[test]
fn test_multiple_initializers() {
    let source = b"pub let x, y = 1, 2.5 * y;";
    let tree = parse(source).expect("parse failed");

    assert!(tree.diagnostics.is_empty());
    let decl = tree.as_module(ROOT_NODE).decls[0];
    let view = tree.as_vardecl(decl);
    assert!(view.is_public);
    assert_eq!(view.exprs.len(), 2);
    assert_eq!(tree.symbol(view.exprs[0]), Symbol::LiteralInt);
    assert_eq!(tree.symbol(view.exprs[1]), Symbol::Mul);
}

#[test]
fn test_literal_kinds() {
    let tree = parse(br#"let a = 1, 2.0, "s", 'c', true, false;"#).expect("parse failed");

    assert!(tree.diagnostics.is_empty());
    assert_eq!(
        tree.symbols()[2..],
        [
            Symbol::LiteralInt,
            Symbol::LiteralFloat,
            Symbol::LiteralString,
            Symbol::LiteralChar,
            Symbol::LiteralTrue,
            Symbol::LiteralFalse,
        ]
    );
}

#[test]
fn test_every_binary_operator() {
    let cases = [
        ("+", Symbol::Add),
        ("-", Symbol::Sub),
        ("*", Symbol::Mul),
        ("/", Symbol::Div),
        ("%", Symbol::Mod),
        ("==", Symbol::Eq),
        ("!=", Symbol::Ne),
        ("<", Symbol::Lt),
        ("<=", Symbol::Le),
        (">", Symbol::Gt),
        (">=", Symbol::Ge),
        ("&&", Symbol::And),
        ("||", Symbol::Or),
        ("&", Symbol::BitAnd),
        ("|", Symbol::BitOr),
        ("^", Symbol::BitXor),
        ("<<", Symbol::Shl),
        (">>", Symbol::Shr),
    ];
    for (op, symbol) in cases {
        let source = format!("let a = x {op} y;");
        let tree = parse(source.as_bytes()).expect("parse failed");
        assert!(tree.diagnostics.is_empty(), "{op}");

        let binop = tree.as_binop(first_expr(&tree));
        assert_eq!(binop.op, symbol, "{op}");
        assert_eq!(tree.symbol(binop.lhs), Symbol::Name);
        assert_eq!(tree.symbol(binop.rhs), Symbol::Name);
    }
}

#[test]
fn test_precedence_levels() {
    // a || b && c == d | e ^ f & g << h + i * j
    let tree = parse(b"let r = a || b && c == d | e ^ f & g << h + i * j;").expect("parse failed");
    assert!(tree.diagnostics.is_empty());

    let mut nodi = first_expr(&tree);
    let chain = [
        Symbol::Or,
        Symbol::And,
        Symbol::Eq,
        Symbol::BitOr,
        Symbol::BitXor,
        Symbol::BitAnd,
        Symbol::Shl,
        Symbol::Add,
        Symbol::Mul,
    ];
    for symbol in chain {
        let binop = tree.as_binop(nodi);
        assert_eq!(binop.op, symbol);
        assert_eq!(tree.symbol(binop.lhs), Symbol::Name);
        nodi = binop.rhs;
    }
    assert_eq!(tree.symbol(nodi), Symbol::Name);
}

#[test]
fn test_typed_expression() {
    let source = b"let a = b + c : core::Int;";
    let tree = parse(source).expect("parse failed");

    assert!(tree.diagnostics.is_empty());
    let typed = tree.as_typed_expr(first_expr(&tree));
    assert_eq!(tree.symbol(typed.expr), Symbol::Add);
    let ty = tree.as_name(typed.ty);
    assert_eq!(texts(&tree, source, ty.namespaces), vec!["core"]);
    assert_eq!(texts(&tree, source, ty.fields), vec!["Int"]);
    assert_eq!(tree.terminal(first_expr(&tree)), Terminal::Colon);
}

#[test]
fn test_typed_expression_inside_group() {
    let tree = parse(b"let a = (b : Float) * 2;").expect("parse failed");

    assert!(tree.diagnostics.is_empty());
    let mul = tree.as_binop(first_expr(&tree));
    assert_eq!(mul.op, Symbol::Mul);
    assert_eq!(tree.symbol(mul.lhs), Symbol::TypedExpr);
}

#[test]
fn test_several_declarations() {
    let source = b"let a = 1;\npub let b = a;\n// comment\nlet c, d = a, b;\n";
    let tree = parse(source).expect("parse failed");

    assert!(tree.diagnostics.is_empty());
    let decls = tree.as_module(ROOT_NODE).decls;
    assert_eq!(decls.len(), 3);
    assert!(tree.as_vardecl(decls[1]).is_public);
    assert_eq!(texts(&tree, source, tree.as_vardecl(decls[2]).identifiers), vec!["c", "d"]);
}

#[test]
fn test_deterministic() {
    let source = b"let a = (1 + x::y.z) * 3 : T; fn oops; let b = ;";
    let first = parse(source).expect("parse failed");
    let second = parse(source).expect("parse failed");

    assert_eq!(first, second);
    assert_eq!(first.symbols(), second.symbols());
    assert_eq!(first.diagnostics, second.diagnostics);
}

#[test]
fn test_deeply_nested_groups() {
    let depth = 100_000;
    let source = format!("let a = {}1{};", "(".repeat(depth), ")".repeat(depth));
    let tree = parse(source.as_bytes()).expect("parse failed");

    assert!(tree.diagnostics.is_empty());
    assert_eq!(tree.symbols(), vec![Symbol::Module, Symbol::VarDecl, Symbol::LiteralInt]);
}

#[test]
fn test_deeply_nested_operators() {
    let depth = 50_000;
    let mut source = String::from("let a = ");
    for _ in 0..depth {
        source.push_str("1 + (");
    }
    source.push('1');
    source.push_str(&")".repeat(depth));
    source.push(';');

    let tree = parse(source.as_bytes()).expect("parse failed");
    assert!(tree.diagnostics.is_empty());

    let symbols = tree.symbols();
    assert_eq!(symbols.iter().filter(|&&s| s == Symbol::Add).count(), depth);
    assert_eq!(symbols.iter().filter(|&&s| s == Symbol::LiteralInt).count(), depth + 1);
    let max_depth = tree.iter().map(|(_, depth)| depth).max();
    assert_eq!(max_depth, Some(depth + 2));
}

#[test]
fn test_error_node_is_only_reachable_through_recovery() {
    let tree = parse(b"let a = 1;").expect("parse failed");
    assert!(tree.iter().all(|(nodi, _)| nodi != ERROR_NODE));
}
