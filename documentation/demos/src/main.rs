//! One selection, two shapes.
//!
//! Builds a small staffing model, seeds the reference in-memory engine, and
//! compiles the same field selection twice: once graph-preserving (nested
//! objects and collections) and once flattening (one row per joined leaf
//! combination). Prints the compiled plan and the materialized result for
//! each, then shows clause validation rejecting an injection attempt.
//!
//! Run with: cargo run --release

use std::error::Error;

use quarry_core::catalog::{
    DomainModel, EntityDescriptor, FieldDescriptor, ModelCatalog, RelationDescriptor, ScalarType,
};
use quarry_core::engine::MemoryEngine;
use quarry_core::orchestrate::{QueryOrchestrator, QueryRequest, QueryShape};
use quarry_core::plan::{plan_text, Value};

fn staff_model() -> DomainModel {
    DomainModel::new()
        .with_entity(
            EntityDescriptor::new("Employee", "id")
                .with_field(FieldDescriptor::new("id", ScalarType::Int64))
                .with_field(FieldDescriptor::new("firstName", ScalarType::String))
                .with_field(FieldDescriptor::new("salary", ScalarType::Int64).nullable())
                .with_relation(RelationDescriptor::to_one("department", "Department")),
        )
        .with_entity(
            EntityDescriptor::new("Department", "id")
                .with_field(FieldDescriptor::new("id", ScalarType::Int64))
                .with_field(FieldDescriptor::new("name", ScalarType::String))
                .with_relation(RelationDescriptor::to_many("employees", "Employee"))
                .with_relation(RelationDescriptor::to_many("projects", "Project")),
        )
        .with_entity(
            EntityDescriptor::new("Project", "id")
                .with_field(FieldDescriptor::new("id", ScalarType::Int64))
                .with_field(FieldDescriptor::new("title", ScalarType::String)),
        )
}

fn seed(engine: &mut MemoryEngine<'_>) -> Result<(), Box<dyn Error>> {
    let sales = engine.insert(
        "Department",
        vec![("id", Value::Int64(1)), ("name", "Sales".into())],
    )?;
    let labs = engine.insert(
        "Department",
        vec![("id", Value::Int64(2)), ("name", "Labs".into())],
    )?;

    for (id, title, department) in [
        (1, "apollo", sales),
        (2, "borealis", sales),
        (3, "callisto", labs),
    ] {
        let project = engine.insert(
            "Project",
            vec![("id", Value::Int64(id)), ("title", title.into())],
        )?;
        engine.link(department, "projects", project)?;
    }

    for (id, name, salary, department) in [
        (1, "Ada", Some(140), Some(sales)),
        (2, "Bob", Some(95), Some(sales)),
        (3, "Cid", Some(120), Some(labs)),
        (4, "Dot", None, None),
    ] {
        let mut fields = vec![("id", Value::Int64(id)), ("firstName", name.into())];
        if let Some(salary) = salary {
            fields.push(("salary", Value::Int64(salary)));
        }
        let employee = engine.insert("Employee", fields)?;
        if let Some(department) = department {
            engine.link(employee, "department", department)?;
            engine.link(department, "employees", employee)?;
        }
    }
    Ok(())
}

fn section(title: &str) {
    println!();
    println!("=== {title} ===");
    println!();
}

fn main() -> Result<(), Box<dyn Error>> {
    let catalog = ModelCatalog::build(staff_model())?;
    let mut engine = MemoryEngine::new(&catalog);
    seed(&mut engine)?;

    let orchestrator = QueryOrchestrator::new(&catalog);
    let paths = vec![
        "firstName".to_string(),
        "department.name".to_string(),
        "department.projects.title".to_string(),
    ];

    section("Graph-preserving shape");
    let request = QueryRequest::new("Employee")
        .with_paths(paths.clone())
        .with_filter("salary >= 100")
        .with_sort("firstName asc");
    let run = orchestrator.run(request)?;
    println!("{}", plan_text(&run.query));
    let result = run.query.execute_on(&engine)?;
    if let Some(rows) = result.as_graph() {
        println!("{}", serde_json::to_string_pretty(rows)?);
    }

    section("Flattening shape");
    let request = QueryRequest::new("Employee")
        .with_paths(paths)
        .with_shape(QueryShape::Flat)
        .with_filter("salary >= 100")
        .with_sort("firstName asc");
    let run = orchestrator.run(request)?;
    println!("{}", plan_text(&run.query));
    let result = run.query.execute_on(&engine)?;
    if let Some(flat) = result.as_flat() {
        println!("{}", flat.columns.join(" | "));
        for row in &flat.rows {
            let cells: Vec<String> = row
                .iter()
                .map(serde_json::to_string)
                .collect::<Result<_, _>>()?;
            println!("{}", cells.join(" | "));
        }
    }

    section("Clause validation");
    let request = QueryRequest::new("Employee")
        .with_path("firstName")
        .with_filter("firstName == 'x'; DROP TABLE employees");
    match orchestrator.run(request) {
        Ok(_) => println!("unexpectedly accepted"),
        Err(err) => println!("rejected: {err}"),
    }

    Ok(())
}
