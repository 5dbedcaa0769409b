use serde::Deserialize;
use serde_json::Value;
use std::fs;
use vet::{Schema, SerdeSchema};

#[derive(Deserialize)]
struct TestSuite {
    name: String,
    schema: SerdeSchema,
    instances: Vec<TestCase>,
}

#[derive(Deserialize)]
struct TestCase {
    instance: Value,

    /// What a successful parse returns. Absent means the instance itself.
    #[serde(default)]
    output: Option<Value>,

    /// The expected rejection. Absent means the instance is valid.
    #[serde(default)]
    error: Option<String>,
}

#[test]
fn suites() -> Result<(), std::io::Error> {
    let test_files = fs::read_dir("tests/suites")?;
    for entry in test_files {
        let path = entry?.path();
        println!("{:?}", &path);
        let file = fs::read(path)?;
        let suites: Vec<TestSuite> = serde_json::from_slice(&file)?;

        for (i, suite) in suites.into_iter().enumerate() {
            println!("{}: {}", i, suite.name);

            let schema = Schema::from_serde(suite.schema).unwrap();
            let compiled = schema.compile();

            for (j, test_case) in suite.instances.into_iter().enumerate() {
                println!("{}/{}", i, j);

                let expected = match test_case.error {
                    Some(error) => Err(error),
                    None => Ok(test_case
                        .output
                        .clone()
                        .unwrap_or_else(|| test_case.instance.clone())),
                };

                let interpreted = schema
                    .parse(&test_case.instance)
                    .map(|value| value.into_owned())
                    .map_err(|err| err.into_message());
                assert_eq!(expected, interpreted);

                let compiled = compiled
                    .parse(&test_case.instance)
                    .map(|value| value.into_owned())
                    .map_err(|err| err.into_message());
                assert_eq!(expected, compiled);
            }
        }
    }

    Ok(())
}
