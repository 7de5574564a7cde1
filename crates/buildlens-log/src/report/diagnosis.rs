use lazy_static::lazy_static;
use regex::Regex;

use super::Haystack;
use super::bug::find_location;
use crate::ir::ErrorEntry;

lazy_static! {
    static ref SYMBOL: Regex = Regex::new(r"symbol:\s+(\w+)\s+(\w+)").unwrap();
    static ref PACKAGE: Regex = Regex::new(r"package\s+([\w.]+)").unwrap();
    static ref EXCEPTION_NAME: Regex = Regex::new(r"(\w+(?:Exception|Error)):").unwrap();
}

/// Output of one diagnosis rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Finding {
    /// Whether this finding names the kind of error.
    pub classifies: bool,
    pub lines: Vec<String>,
}

impl Finding {
    fn classification(lines: Vec<String>) -> Self {
        Self {
            classifies: true,
            lines,
        }
    }

    fn hint(lines: Vec<String>) -> Self {
        Self {
            classifies: false,
            lines,
        }
    }
}

type Rule = fn(&Haystack, &[Finding]) -> Option<Finding>;

/// Every rule runs; earlier findings are visible to later rules.
static RULES: &[Rule] = &[
    missing_symbol,
    missing_package,
    null_pointer,
    type_mismatch,
    assertion_failure,
    lombok,
    mybatis_mapper,
    dependency_injection,
    database_connection,
    source_location,
    exception_type,
    domain_model,
];

pub fn findings(entry: &ErrorEntry) -> Vec<Finding> {
    let haystack = Haystack::new(entry);
    let mut found: Vec<Finding> = Vec::new();
    for rule in RULES {
        if let Some(finding) = rule(&haystack, &found) {
            found.push(finding);
        }
    }
    found
}

/// Diagnosis lines for the full report, empty when nothing is recognized.
pub fn diagnose(entry: &ErrorEntry) -> Vec<String> {
    findings(entry).into_iter().flat_map(|f| f.lines).collect()
}

fn lines(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn fixes(items: &[&str]) -> Vec<String> {
    let mut out = vec!["[*] Suggested fixes:".to_string()];
    out.extend(
        items
            .iter()
            .enumerate()
            .map(|(i, item)| format!("    {}. {}", i + 1, item)),
    );
    out
}

fn missing_symbol(h: &Haystack, _: &[Finding]) -> Option<Finding> {
    if !h.text.contains("cannot find symbol") {
        return None;
    }
    let mut out = lines(&["[X] Error type: symbol not found (compilation error)"]);
    if let Some(caps) = SYMBOL.captures(&h.text) {
        let (kind, name) = (&caps[1], &caps[2]);
        out.push(format!("    Missing symbol: {kind} {name}"));
        match kind {
            "class" => out.extend(fixes(&[
                "Check for a missing import statement",
                "Check the spelling of the class name",
                "Check that a Maven dependency provides the class",
            ])),
            "method" => out.extend(fixes(&[
                "Check the spelling of the method name",
                "Check that the receiver type declares the method",
                "Check whether a cast is needed",
            ])),
            "variable" => out.extend(fixes(&[
                "Check that the variable is declared",
                "Check that the variable is in scope",
            ])),
            _ => {}
        }
    }
    Some(Finding::classification(out))
}

fn missing_package(h: &Haystack, _: &[Finding]) -> Option<Finding> {
    if !(h.text.contains("package") && h.text.contains("does not exist")) {
        return None;
    }
    let mut out = lines(&["[X] Error type: package does not exist (missing dependency)"]);
    if let Some(caps) = PACKAGE.captures(&h.text) {
        out.push(format!("    Missing package: {}", &caps[1]));
        out.extend(fixes(&[
            "Add the corresponding Maven dependency to pom.xml",
            "Rebuild with mvn clean install",
            "Check that dependency versions are compatible",
        ]));
    }
    Some(Finding::classification(out))
}

fn null_pointer(h: &Haystack, _: &[Finding]) -> Option<Finding> {
    if !(h.text.contains("NullPointerException") || h.text.contains("NPE")) {
        return None;
    }
    let mut out = lines(&["[X] Error type: null pointer (runtime error)"]);
    out.extend(fixes(&[
        "Check that the object is initialized",
        "Add a null check or use Optional",
        "Guard value object constructors with Objects.requireNonNull()",
    ]));
    Some(Finding::classification(out))
}

fn type_mismatch(h: &Haystack, _: &[Finding]) -> Option<Finding> {
    if !(h.text.contains("incompatible types") || h.text.contains("type mismatch")) {
        return None;
    }
    let mut out = lines(&["[X] Error type: incompatible types (compilation error)"]);
    out.extend(fixes(&[
        "Check that declared and assigned types agree",
        "Add the required conversion",
        "Check generic type parameters",
    ]));
    Some(Finding::classification(out))
}

fn assertion_failure(h: &Haystack, _: &[Finding]) -> Option<Finding> {
    let expected_but_was = h.lower.contains("expected") && h.lower.contains("but was");
    if !(h.text.contains("AssertionError") || expected_but_was) {
        return None;
    }
    let mut out = lines(&["[X] Error type: assertion failed (test failure)"]);
    out.extend(fixes(&[
        "Check the expected value in the test",
        "Check that mock behaviour is fully stubbed",
        "Check that the test data satisfies the business rules",
    ]));
    Some(Finding::classification(out))
}

fn lombok(h: &Haystack, _: &[Finding]) -> Option<Finding> {
    if !h.lower.contains("lombok") {
        return None;
    }
    let mut out = lines(&["[!] Possibly a Lombok problem"]);
    out.extend(fixes(&[
        "Install the Lombok plugin in the IDE",
        "Enable annotation processing",
        "Check Lombok version compatibility",
    ]));
    Some(Finding::hint(out))
}

fn mybatis_mapper(h: &Haystack, _: &[Finding]) -> Option<Finding> {
    if !(h.lower.contains("mapper") || h.text.contains("@MapperScan")) {
        return None;
    }
    let mut out = lines(&["[!] Possibly a MyBatis mapper problem"]);
    out.extend(fixes(&[
        "Check the @MapperScan base package",
        "Check where the mapper interface lives",
        "Check the XML mapper file path",
    ]));
    Some(Finding::hint(out))
}

fn dependency_injection(h: &Haystack, _: &[Finding]) -> Option<Finding> {
    if !(h.lower.contains("could not autowire") || h.lower.contains("no qualifying bean")) {
        return None;
    }
    let mut out = lines(&["[X] Error type: dependency injection failed (configuration error)"]);
    out.extend(fixes(&[
        "Check for a @Component/@Service annotation",
        "Check the component scan base packages",
        "Look for circular dependencies",
    ]));
    Some(Finding::classification(out))
}

fn database_connection(h: &Haystack, _: &[Finding]) -> Option<Finding> {
    let refused_or_timeout = h.lower.contains("refused") || h.lower.contains("timeout");
    if !(h.lower.contains("connection") && refused_or_timeout) {
        return None;
    }
    let mut out = lines(&["[X] Error type: database connection failed (environment error)"]);
    out.extend(fixes(&[
        "Check that the database is running",
        "Check the connection settings in application.yml",
        "Check network access and firewall rules",
    ]));
    Some(Finding::classification(out))
}

fn source_location(h: &Haystack, _: &[Finding]) -> Option<Finding> {
    let loc = find_location(&h.text)?;
    let mut out = vec![
        format!("[*] Location: {}", loc.file_name()),
        format!("    Path: {}", loc.path),
        format!("    Line/column: [{}, {}]", loc.line, loc.column),
    ];
    let path = loc.path.to_lowercase();
    let layer = if path.contains("infrastructure") {
        Some("infrastructure")
    } else if path.contains("domain") {
        Some("domain")
    } else if path.contains("application") {
        Some("application")
    } else if path.contains("interface") || path.contains("controller") {
        Some("interface")
    } else {
        None
    };
    if let Some(layer) = layer {
        out.push(format!("[*] Layer: {layer}"));
    }
    Some(Finding::hint(out))
}

fn exception_type(h: &Haystack, earlier: &[Finding]) -> Option<Finding> {
    if earlier.iter().any(|f| f.classifies) {
        return None;
    }
    let caps = EXCEPTION_NAME.captures(&h.text)?;
    Some(Finding::hint(vec![format!("[!] Exception type: {}", &caps[1])]))
}

fn domain_model(h: &Haystack, _: &[Finding]) -> Option<Finding> {
    let hit = ["aggregate", "entity", "valueobject"]
        .iter()
        .any(|word| h.lower.contains(word));
    if !hit {
        return None;
    }
    Some(Finding::hint(lines(&[
        "[*] Domain model hint:",
        "    Check the invariants and business rules of the domain model",
    ])))
}
