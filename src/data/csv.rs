//! CSV dataset loading.
//!
//! Two layouts are supported. In the instance-rows layout every data row is
//! one instance with the class label in column 0. In the transposed layout
//! the header carries one class label per instance and every data row is
//! one attribute. In both layouts attribute ids are assigned from the
//! original column (or row) order, starting at 0.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use csv::ReaderBuilder;
use itertools::Itertools;
use ndarray::Array2;

use crate::data::{AttributeCatalog, Dataset};
use crate::error::{FcnError, Result};

fn read_records(path: &Path) -> Result<Vec<csv::StringRecord>> {
    let file = File::open(path)?;
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(file);

    let mut records = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| {
            FcnError::parse(&path.display().to_string(), "", &e.to_string())
        })?;
        records.push(record);
    }
    Ok(records)
}

fn line_of(record: &csv::StringRecord) -> String {
    record.iter().join(",")
}

fn parse_value(path: &Path, record: &csv::StringRecord, token: &str) -> Result<f64> {
    token.trim().parse::<f64>().map_err(|_| {
        FcnError::parse(
            &path.display().to_string(),
            &line_of(record),
            &format!("invalid numeric value '{token}'"),
        )
    })
}

/// Load the instance-rows layout: header `CLASS,attr1,...,attrN`, then one
/// row per instance, class label first.
pub fn load_instance_rows(path: &Path) -> Result<Dataset> {
    let file_name = path.display().to_string();
    let records = read_records(path)?;
    let Some((header, rows)) = records.split_first() else {
        return Err(FcnError::parse(&file_name, "", "empty dataset file"));
    };

    if header.len() < 2 {
        return Err(FcnError::parse(
            &file_name,
            &line_of(header),
            "header must name the class column and at least one attribute",
        ));
    }

    let names: Vec<&str> = header.iter().skip(1).map(str::trim).collect();
    let catalog = AttributeCatalog::from_names(&names)?;
    let num_attr = names.len();

    let mut labels = Vec::with_capacity(rows.len());
    let mut values = Vec::with_capacity(rows.len() * num_attr);
    for row in rows {
        if row.len() != num_attr + 1 {
            return Err(FcnError::parse(
                &file_name,
                &line_of(row),
                &format!("expected {} fields, found {}", num_attr + 1, row.len()),
            ));
        }

        labels.push(row[0].trim().to_string());
        for token in row.iter().skip(1) {
            values.push(parse_value(path, row, token)?);
        }
    }

    let data = Array2::from_shape_vec((labels.len(), num_attr), values)
        .map_err(|e| FcnError::DataIntegrity(e.to_string()))?;
    Dataset::new(catalog, data, labels, &file_name)
}

/// Load the transposed layout: the header row carries one class label per
/// instance (first field ignored), then one row per attribute, attribute
/// name first.
pub fn load_transposed(path: &Path) -> Result<Dataset> {
    let file_name = path.display().to_string();
    let records = read_records(path)?;
    let Some((header, rows)) = records.split_first() else {
        return Err(FcnError::parse(&file_name, "", "empty dataset file"));
    };

    if header.len() < 2 {
        return Err(FcnError::parse(
            &file_name,
            &line_of(header),
            "header must carry at least one instance label",
        ));
    }

    let labels: Vec<String> = header
        .iter()
        .skip(1)
        .map(|l| l.trim().to_string())
        .collect();
    let num_inst = labels.len();

    let mut names = Vec::with_capacity(rows.len());
    // values arrive attribute-major; collected row by row, transposed below
    let mut columns: Vec<Vec<f64>> = Vec::with_capacity(rows.len());
    for row in rows {
        if row.len() != num_inst + 1 {
            return Err(FcnError::parse(
                &file_name,
                &line_of(row),
                &format!("expected {} fields, found {}", num_inst + 1, row.len()),
            ));
        }

        names.push(row[0].trim().to_string());
        let mut column = Vec::with_capacity(num_inst);
        for token in row.iter().skip(1) {
            column.push(parse_value(path, row, token)?);
        }
        columns.push(column);
    }

    let catalog = AttributeCatalog::from_names(&names)?;
    let num_attr = names.len();

    let mut values = Vec::with_capacity(num_inst * num_attr);
    for inst in 0..num_inst {
        for column in &columns {
            values.push(column[inst]);
        }
    }

    let data = Array2::from_shape_vec((num_inst, num_attr), values)
        .map_err(|e| FcnError::DataIntegrity(e.to_string()))?;
    Dataset::new(catalog, data, labels, &file_name)
}

/// Write the instance-rows projection of `dataset` restricted to the named
/// attributes: header `CLASS,<names...>`, one row per instance.
pub fn write_subset(dataset: &Dataset, names: &[String], path: &Path) -> Result<()> {
    let mut ids = Vec::with_capacity(names.len());
    for name in names {
        let id = dataset.catalog().index_of(name).ok_or_else(|| {
            FcnError::DataIntegrity(format!("unknown attribute '{name}' in subset selection"))
        })?;
        ids.push(id);
    }

    log::info!(
        "Writing {}-attribute subset of {} to {}",
        ids.len(),
        dataset.source(),
        path.display()
    );

    let mut out = BufWriter::new(File::create(path)?);
    writeln!(out, "CLASS,{}", names.iter().join(","))?;
    for (inst, label) in dataset.labels().iter().enumerate() {
        let row = ids
            .iter()
            .map(|&id| dataset.column(id)[inst].to_string())
            .join(",");
        writeln!(out, "{label},{row}")?;
    }
    out.flush()?;

    Ok(())
}
