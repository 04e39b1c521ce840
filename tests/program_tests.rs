mod common;

use common::{init_logger, manga_file, parse, Outcome, Vm};
use pretty_assertions::assert_eq;
use turinc::ast::{Expression, Program, Statement, TurinFile, TypeUsage};
use turinc::codegen::flag::access_flags::{ACC_PUBLIC, ACC_STATIC};
use turinc::{compile, Config, Error, InFileResolver};

fn println(value: Expression) -> Statement {
    Statement::expression(Expression::method_call(Expression::static_field("System", "out"), "println", vec![value]))
}

fn run(file: &TurinFile, main_class: &str) -> (Vm, Outcome) {
    init_logger();
    let resolver = InFileResolver::new(file);
    let artifacts = compile(file, &resolver, &Config::default()).expect("program should compile");
    let mut vm = Vm::new(&artifacts);
    let outcome = vm.run_main(main_class);
    (vm, outcome)
}

#[test]
fn test_hello_world() {
    let file = TurinFile::new("hello").with_program(Program::new("Main").with_statement(println(Expression::string("Hello, world!"))));
    let (vm, outcome) = run(&file, "hello/Main");
    assert_eq!(outcome, Outcome::Returned(None));
    assert_eq!(vm.stdout, "Hello, world!\n");

    let class = vm.class("hello/Main");
    let main = class.method("main").expect("main method");
    assert_eq!(main.descriptor, "([Ljava/lang/String;)V");
    assert_eq!(main.access, ACC_PUBLIC | ACC_STATIC);
    assert_eq!(class.methods.len(), 1);
    assert!(class.fields.is_empty());
}

#[test]
fn test_println_overloads_and_library_calls() {
    let program = Program::new("Calls")
        .with_statement(println(Expression::int(42)))
        .with_statement(println(Expression::int(-70_000)))
        .with_statement(println(Expression::static_field("Integer", "MAX_VALUE")))
        .with_statement(println(Expression::method_call(Expression::string("turin"), "length", vec![])))
        .with_statement(println(Expression::call(Expression::static_field("Integer", "toString"), vec![Expression::int(7)])))
        .with_statement(println(Expression::call(Expression::static_field("Math", "abs"), vec![Expression::int(-9)])))
        .with_statement(println(Expression::method_call(
            Expression::string("a"),
            "concat",
            vec![Expression::string("b")],
        )))
        .with_statement(Statement::expression(Expression::method_call(
            Expression::static_field("System", "out"),
            "println",
            vec![],
        )));
    let file = TurinFile::new("demo").with_program(program);
    let (vm, outcome) = run(&file, "demo/Calls");
    assert_eq!(outcome, Outcome::Returned(None));
    assert_eq!(vm.stdout, "42\n-70000\n2147483647\n5\n7\n9\nab\n\n");
}

#[test]
fn test_locals_and_slots() {
    let program = Program::new("Locals")
        .with_statement(Statement::var("n", Expression::int(5)))
        .with_statement(Statement::typed_var("s", TypeUsage::reference("String"), Expression::string("x")))
        .with_statement(Statement::var("len", Expression::method_call(Expression::string("abc"), "length", vec![])))
        .with_statement(println(Expression::string("done")));
    let file = TurinFile::new("demo").with_program(program);
    let (vm, outcome) = run(&file, "demo/Locals");
    assert_eq!(outcome, Outcome::Returned(None));
    assert_eq!(vm.stdout, "done\n");

    let class = vm.class("demo/Locals");
    let code = class.code(class.method("main").expect("main"));
    // args plus three single-slot locals
    assert_eq!(code.max_locals, 4);
    assert_eq!(code.max_stack, 2);
    assert_eq!(code.code.last(), Some(&0xb1));
    assert!(code.attribute("StackMapTable").is_none());
}

#[test]
fn test_explicit_return_matches_implicit() {
    init_logger();
    let implicit = TurinFile::new("demo").with_program(Program::new("Main").with_statement(println(Expression::int(1))));
    let explicit = TurinFile::new("demo").with_program(
        Program::new("Main").with_statement(println(Expression::int(1))).with_statement(Statement::Return),
    );
    let a = compile(&implicit, &InFileResolver::new(&implicit), &Config::default()).expect("implicit");
    let b = compile(&explicit, &InFileResolver::new(&explicit), &Config::default()).expect("explicit");
    assert_eq!(a[0].bytecode(), b[0].bytecode());

    let empty = TurinFile::new("demo").with_program(Program::new("Empty"));
    let artifacts = compile(&empty, &InFileResolver::new(&empty), &Config::default()).expect("empty program");
    let class = parse(&artifacts[0]);
    let code = class.code(class.method("main").expect("main"));
    assert_eq!(code.code, vec![0xb1]);
    assert_eq!(code.max_stack, 0);
    assert_eq!(code.max_locals, 1);
}

#[test]
fn test_program_using_file_type() {
    let file = manga_file().with_program(
        Program::new("Show")
            .with_statement(Statement::var(
                "ranma",
                Expression::creation("MangaCharacter", vec![Expression::string("Ranma"), Expression::int(16)]),
            ))
            .with_statement(println(Expression::method_call(
                Expression::creation("MangaCharacter", vec![Expression::string("Akane"), Expression::int(16)]),
                "getName",
                vec![],
            )))
            .with_statement(println(Expression::creation(
                "MangaCharacter",
                vec![Expression::string("Genma"), Expression::int(-1)],
            ))),
    );
    let (vm, outcome) = run(&file, "manga/Show");
    assert_eq!(vm.stdout, "Akane\n");
    assert_eq!(
        outcome,
        Outcome::Threw {
            class: "java/lang/IllegalArgumentException".to_string(),
            message: Some("age should be positive".to_string()),
        }
    );
}

#[test]
fn test_program_errors() {
    init_logger();
    let cases = vec![
        Program::new("Late").with_statement(Statement::Return).with_statement(println(Expression::int(1))),
        Program::new("Discard").with_statement(Statement::expression(Expression::method_call(
            Expression::string("x"),
            "length",
            vec![],
        ))),
        Program::new("Field").with_statement(println(Expression::field(Expression::string("x"), "length"))),
    ];
    for program in cases {
        let name = program.name.clone();
        let file = TurinFile::new("demo").with_program(program);
        let result = compile(&file, &InFileResolver::new(&file), &Config::default());
        assert!(matches!(result, Err(Error::UnsupportedConstruct { .. })), "{} should be rejected", name);
    }

    let unknown = TurinFile::new("demo").with_program(
        Program::new("Unknown").with_statement(println(Expression::static_field("System", "in"))),
    );
    let result = compile(&unknown, &InFileResolver::new(&unknown), &Config::default());
    assert!(matches!(result, Err(Error::Resolution { .. })));

    let mismatch = TurinFile::new("demo").with_program(Program::new("Mismatch").with_statement(Statement::typed_var(
        "n",
        TypeUsage::reference("Long"),
        Expression::int(1),
    )));
    let result = compile(&mismatch, &InFileResolver::new(&mismatch), &Config::default());
    assert!(matches!(result, Err(Error::Resolution { .. })));
}
