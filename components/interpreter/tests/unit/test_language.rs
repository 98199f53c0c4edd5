//! Script-level semantics: expressions, control flow, closures and classes

use super::run;

fn output(source: &str) -> String {
    run(source).unwrap()
}

#[test]
fn test_arithmetic_and_rendering() {
    assert_eq!(output("print 1 + 2 * 3;"), "7\n");
    assert_eq!(output("print (1 + 2) * 3 - 4 / 2;"), "7\n");
    assert_eq!(output("print 0.1 + 0.2;"), "0.3\n");
    assert_eq!(output("print 123456789 * 10;"), "1.23457e+09\n");
    assert_eq!(output("print 1 / 0;"), "inf\n");
    assert_eq!(output("print -(2);"), "-2\n");
    assert_eq!(output("print nil; print true; print !nil;"), "nil\ntrue\ntrue\n");
}

#[test]
fn test_comparison_and_equality() {
    assert_eq!(output("print 1 < 2; print 2 <= 2; print 3 > 4; print 4 >= 5;"), "true\ntrue\nfalse\nfalse\n");
    assert_eq!(output("print 1 == 1; print 1 != 1; print nil == false;"), "true\nfalse\nfalse\n");
    assert_eq!(output("print \"ab\" == \"a\" + \"b\";"), "true\n");
}

#[test]
fn test_string_concatenation() {
    assert_eq!(output("print \"foo\" + \"bar\";"), "foobar\n");
    assert_eq!(output("print \"n=\" + 1;"), "n=1\n");
    assert_eq!(output("print 2 + \"x\";"), "2x\n");
    assert_eq!(output("print \"is \" + nil;"), "is nil\n");
}

#[test]
fn test_logical_operators() {
    assert_eq!(output("print nil or \"x\"; print false and 1; print 1 and 2;"), "x\nfalse\n2\n");
}

#[test]
fn test_globals_and_locals() {
    let source = "
        var a = \"global\";
        {
            var a = \"outer\";
            {
                var a = \"inner\";
                print a;
            }
            print a;
        }
        print a;
        a = \"changed\";
        print a;
    ";
    assert_eq!(output(source), "inner\nouter\nglobal\nchanged\n");
}

#[test]
fn test_control_flow() {
    let source = "
        var sum = 0;
        for (var i = 0; i < 5; i = i + 1) sum = sum + i;
        print sum;
        var n = 3;
        while (n > 0) { n = n - 1; }
        print n;
        if (sum > 5) print \"big\"; else print \"small\";
        if (false) print \"no\";
    ";
    assert_eq!(output(source), "10\n0\nbig\n");
}

#[test]
fn test_recursion() {
    let source = "
        fun fib(n) { if (n < 2) return n; return fib(n - 1) + fib(n - 2); }
        print fib(15);
    ";
    assert_eq!(output(source), "610\n");
}

#[test]
fn test_function_values() {
    assert_eq!(output("fun f() {} print f; print f();"), "<fn f>\nnil\n");
    assert_eq!(output("print clock;"), "<native fn>\n");
    assert_eq!(output("print clock() >= 0;"), "true\n");
}

#[test]
fn test_counter_outlives_its_frame() {
    let source = "
        fun makeCounter() {
            var i = 0;
            fun count() { i = i + 1; return i; }
            return count;
        }
        var c = makeCounter();
        print c();
        print c();
        var d = makeCounter();
        print d();
        print c();
    ";
    assert_eq!(output(source), "1\n2\n1\n3\n");
}

#[test]
fn test_closures_share_a_variable() {
    let source = "
        var get;
        var set;
        fun make() {
            var x = \"a\";
            fun g() { return x; }
            fun s(v) { x = v; }
            get = g;
            set = s;
        }
        make();
        set(\"b\");
        print get();
    ";
    assert_eq!(output(source), "b\n");
}

#[test]
fn test_open_upvalue_sees_later_assignment() {
    let source = "
        {
            var a = 1;
            fun f() { return a; }
            a = 2;
            print f();
        }
    ";
    assert_eq!(output(source), "2\n");
}

#[test]
fn test_nested_capture_through_middle_function() {
    let source = "
        fun outer() {
            var x = \"outer\";
            fun middle() {
                fun inner() { return x; }
                return inner;
            }
            return middle;
        }
        print outer()()();
    ";
    assert_eq!(output(source), "outer\n");
}

#[test]
fn test_class_with_initializer() {
    let source = "
        class Pair {
            init(a, b) { this.a = a; this.b = b; }
            sum() { return this.a + this.b; }
        }
        var p = Pair(1, 2);
        print p.sum();
        print p;
        print Pair;
        p.a = 10;
        print p.sum();
    ";
    assert_eq!(output(source), "3\nPair instance\nPair\n12\n");
}

#[test]
fn test_initializer_returns_instance() {
    let source = "
        class A { init() { this.x = 1; return; } }
        var a = A();
        print a.init();
        print a.x;
    ";
    assert_eq!(output(source), "A instance\n1\n");
}

#[test]
fn test_inherited_and_overridden_methods() {
    let source = "
        class A {
            name() { return \"A\"; }
            hello() { return \"hello \" + this.name(); }
        }
        class B < A { name() { return \"B\"; } }
        class C < A {}
        print B().hello();
        print C().hello();
    ";
    assert_eq!(output(source), "hello B\nhello A\n");
}

#[test]
fn test_super_calls() {
    let source = "
        class A { greet() { return \"A\"; } }
        class B < A {
            greet() { return \"B+\" + super.greet(); }
            later() { var m = super.greet; return m(); }
        }
        print B().greet();
        print B().later();
    ";
    assert_eq!(output(source), "B+A\nA\n");
}

#[test]
fn test_bound_methods_keep_receiver() {
    let source = "
        class Box {
            init(v) { this.v = v; }
            get() { return this.v; }
        }
        var m = Box(7).get;
        print m();
        print m;
    ";
    assert_eq!(output(source), "7\n<fn get>\n");
}

#[test]
fn test_field_shadows_method_on_invoke() {
    let source = "
        class T { f(x) { return \"method\"; } }
        fun twice(x) { return x * 2; }
        var t = T();
        print t.f(1);
        t.f = twice;
        print t.f(21);
    ";
    assert_eq!(output(source), "method\n42\n");
}

#[test]
fn test_method_closure_captures_this() {
    let source = "
        class Counter {
            init() { this.n = 0; }
            incrementer() {
                fun inc() { this.n = this.n + 1; return this.n; }
                return inc;
            }
        }
        var c = Counter();
        var inc = c.incrementer();
        inc();
        print inc();
        print c.n;
    ";
    assert_eq!(output(source), "2\n2\n");
}
