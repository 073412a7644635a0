//! Serializer tests over a hand-built provenance graph

use oxirs_prov::serializer::{serialize, serialize_named};
use oxirs_prov::vocab::{odo, plan, prov, rdf, rdfs, schema};
use oxirs_prov::{ErrorKind, Literal, NamedNode, Namespaces, NodeKind, ProvGraph, RdfFormat};

fn sample_graph() -> ProvGraph {
    let mut graph = ProvGraph::new(Namespaces::provenance());
    let plan_node = graph.mint(NodeKind::Plan);
    graph.insert_types(plan_node, &[&prov::PLAN, &prov::COLLECTION]);
    graph.insert(plan_node, &schema::NAME, Literal::string("Line one\nline \"two\""));

    let step = graph.mint(NodeKind::Step);
    graph.insert(step, &rdf::TYPE, &*plan::STEP);
    graph.insert(step, &rdfs::LABEL, Literal::token("load"));
    graph.insert(step, &plan::IS_STEP_OF_PLAN, plan_node);
    graph.insert(step, &rdf::VALUE, Literal::integer(0));

    let variable = graph.mint(NodeKind::Variable);
    graph.insert(step, &plan::HAS_INPUT_VAR, variable);
    graph.insert(
        variable,
        &rdf::VALUE,
        Literal::new_typed("{\"a\": [1, 2]}", odo::YAML_LITERAL.clone()),
    );

    let person = NamedNode::new("http://lod.bco-dmo.org/id/person/51069").unwrap();
    graph.insert(graph.bundle(), &prov::WAS_ATTRIBUTED_TO, &person);
    graph
}

#[test]
fn test_unsupported_format_leaves_graph_reusable() {
    let graph = sample_graph();
    let triples_before = graph.len();

    let err = serialize_named(&graph, Some("foo")).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnsupportedFormat);
    assert_eq!(graph.len(), triples_before);

    let retry = serialize_named(&graph, Some("turtle")).unwrap();
    assert!(retry.contains("a prov:Bundle"));
}

#[test]
fn test_all_formats_render() {
    let graph = sample_graph();
    for format in RdfFormat::ALL {
        let output = serialize(&graph, format).unwrap();
        assert!(!output.is_empty(), "{format} produced no output");
        assert!(
            output.contains("51069"),
            "{format} output lost the agent IRI"
        );
    }
}

#[test]
fn test_ntriples_one_line_per_triple() {
    let graph = sample_graph();
    let output = serialize(&graph, RdfFormat::NTriples).unwrap();
    assert_eq!(output.lines().count(), graph.len());
    assert!(output.contains(
        "\"Line one\\nline \\\"two\\\"\""
    ));
    assert!(output.contains("\"0\"^^<http://www.w3.org/2001/XMLSchema#integer>"));
    assert!(output.contains("^^<http://ocean-data.org/schema/yamlLiteral>"));
}

#[test]
fn test_turtle_abbreviations() {
    let output = serialize(&sample_graph(), RdfFormat::Turtle).unwrap();
    for prefix in ["dcterms", "odo", "plan", "prov", "rdf", "rdfs", "schema", "xsd"] {
        assert!(output.contains(&format!("@prefix {prefix}: <")), "missing {prefix}");
    }
    assert!(output.contains("\"0\"^^xsd:integer"));
    assert!(output.contains("\"load\"^^xsd:token"));
    assert!(output.contains("prov:wasAttributedTo <http://lod.bco-dmo.org/id/person/51069>"));
}

#[test]
fn test_rdfxml_structure() {
    let output = serialize(&sample_graph(), RdfFormat::RdfXml).unwrap();
    assert!(output.contains("xmlns:plan=\"http://purl.org/net/p-plan#\""));
    assert!(output.contains("<plan:isStepOfPlan rdf:nodeID=\"b1\"/>"));
    assert!(output.contains(
        "<prov:wasAttributedTo rdf:resource=\"http://lod.bco-dmo.org/id/person/51069\"/>"
    ));
    assert!(output.contains("Line one\nline &quot;two&quot;"));
}

#[test]
fn test_jsonld_structure() {
    let output = serialize(&sample_graph(), RdfFormat::JsonLd).unwrap();
    let document: serde_json::Value = serde_json::from_str(&output).unwrap();
    assert_eq!(document["@context"]["schema"], "http://schema.org/");

    let nodes = document["@graph"].as_array().unwrap();
    let bundle = nodes.iter().find(|n| n["@id"] == "_:b0").unwrap();
    assert_eq!(
        bundle["prov:wasAttributedTo"][0]["@id"],
        "http://lod.bco-dmo.org/id/person/51069"
    );
    let step = nodes.iter().find(|n| n["@id"] == "_:b2").unwrap();
    assert_eq!(step["@type"][0], "plan:Step");
    assert_eq!(step["rdfs:label"][0]["@type"], "xsd:token");
}
