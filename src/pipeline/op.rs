// src/pipeline/op.rs
//! Контракты операций и стратегий
//!
//! Операция — чистая функция с проверяемой формой входа и выхода. Каждая
//! операция допускает несколько взаимозаменяемых стратегий; конфигурация
//! стратегии — это тегированное перечисление serde (`#[serde(tag = "strategy")]`),
//! то есть само значение конфигурации и есть выбранная стратегия.
//!
//! `run_validated` проверяет форму входа, исполняет стратегию и проверяет форму
//! выхода; любое расхождение — `ContractError` с идентификатором операции и
//! именем поля. Повторная валидация того же входа идемпотентна: внутренних
//! счётчиков здесь нет.

use crate::error::ContractError;

/// Несоответствие формы одного поля (длина буфера не равна ожидаемой).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShapeIssue {
    pub field: &'static str,
    pub expected: usize,
    pub actual: usize,
}

impl ShapeIssue {
    #[must_use]
    pub fn for_op(self, op: &'static str) -> ContractError {
        ContractError::ShapeMismatch {
            op,
            field: self.field,
            expected: self.expected,
            actual: self.actual,
        }
    }
}

/// Проверяет, что буфер `field` имеет ровно `expected` элементов.
pub fn expect_len(field: &'static str, actual: usize, expected: usize) -> Result<(), ShapeIssue> {
    if actual == expected {
        Ok(())
    } else {
        Err(ShapeIssue {
            field,
            expected,
            actual,
        })
    }
}

/// Стратегия — именованная реализация одной операции.
///
/// Значение, реализующее трейт, — это уже развёрнутая конфигурация стратегии
/// (вариант тегированного перечисления со своими полями).
pub trait Strategy {
    type Input;
    type Output;

    fn run(&self, input: &Self::Input) -> Result<Self::Output, ContractError>;
}

/// Контракт операции: идентификатор плюс проверки формы входа и выхода.
pub struct Operation<S: Strategy> {
    pub id: &'static str,
    pub check_input: fn(&S::Input) -> Result<(), ShapeIssue>,
    pub check_output: fn(&S::Output) -> Result<(), ShapeIssue>,
}

impl<S: Strategy> Operation<S> {
    /// Исполняет стратегию с проверкой контракта на входе и выходе.
    pub fn run_validated(
        &self,
        strategy: &S,
        input: &S::Input,
    ) -> Result<S::Output, ContractError> {
        (self.check_input)(input).map_err(|issue| issue.for_op(self.id))?;
        let output = strategy.run(input)?;
        (self.check_output)(&output).map_err(|issue| issue.for_op(self.id))?;
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Doubler;

    struct DoubleInput {
        values: Vec<f32>,
        expected_len: usize,
    }

    impl Strategy for Doubler {
        type Input = DoubleInput;
        type Output = Vec<f32>;

        fn run(&self, input: &DoubleInput) -> Result<Vec<f32>, ContractError> {
            Ok(input.values.iter().map(|v| v * 2.0).collect())
        }
    }

    fn op() -> Operation<Doubler> {
        Operation {
            id: "test/double",
            check_input: |i| expect_len("values", i.values.len(), i.expected_len),
            check_output: |o| expect_len("output", o.len(), o.len()),
        }
    }

    #[test]
    fn valid_input_passes() {
        let input = DoubleInput {
            values: vec![1.0, 2.0],
            expected_len: 2,
        };
        let out = op().run_validated(&Doubler, &input).unwrap();
        assert_eq!(out, vec![2.0, 4.0]);
    }

    #[test]
    fn shape_mismatch_names_op_and_field() {
        let input = DoubleInput {
            values: vec![1.0],
            expected_len: 2,
        };
        let err = op().run_validated(&Doubler, &input).unwrap_err();
        assert_eq!(
            err,
            ContractError::ShapeMismatch {
                op: "test/double",
                field: "values",
                expected: 2,
                actual: 1,
            }
        );
    }

    #[test]
    fn revalidation_is_idempotent() {
        let input = DoubleInput {
            values: vec![3.0],
            expected_len: 1,
        };
        let once = op().run_validated(&Doubler, &input).unwrap();
        let twice = op().run_validated(&Doubler, &input).unwrap();
        assert_eq!(once, twice);
    }
}
