//! Conversions of domain newtypes into GraphQL scalars.

use std::{fmt, marker::PhantomData, str::FromStr};

use juniper::{
    GraphQLType, InputValue, ParseScalarResult, ParseScalarValue, ScalarToken,
    ScalarValue, Value,
};

/// Adapter for `#[graphql(with = ..)]` attribute, representing a GraphQL
/// scalar as a string in the textual form of the `As` domain type.
///
/// Output goes through the [`Display`] impl of `As`, while input is parsed
/// with its [`FromStr`] impl and then converted with [`TryFrom`].
///
/// [`Display`]: fmt::Display
#[derive(Debug)]
pub struct Via<As>(PhantomData<As>);

impl<As> Via<As> {
    /// Renders the provided `value` as a string [`Value`].
    pub fn to_output<T, S>(value: &T) -> Value<S>
    where
        As: fmt::Display,
        T: AsRef<As>,
        S: ScalarValue,
    {
        Value::from(value.as_ref().to_string())
    }

    /// Parses the provided string [`InputValue`] into the scalar `T`.
    ///
    /// # Errors
    ///
    /// If the `input` is not a string, or is not a valid `As` value, or the
    /// parsed `As` value is rejected by `T`.
    pub fn from_input<T, S>(input: &InputValue<S>) -> Result<T, String>
    where
        As: FromStr,
        As::Err: fmt::Display,
        T: TryFrom<As> + GraphQLType<S, TypeInfo = ()>,
        T::Error: fmt::Display,
        S: ScalarValue,
    {
        let name = T::name(&()).unwrap_or("<unnamed>");

        let Some(s) = input.as_string_value() else {
            return Err(format!(
                "`{name}` scalar expects a string, found: {input}",
            ));
        };
        let parsed = s
            .parse::<As>()
            .map_err(|e| format!("`{name}` scalar rejects \"{s}\": {e}"))?;
        T::try_from(parsed)
            .map_err(|e| format!("`{name}` scalar rejects \"{s}\": {e}"))
    }

    /// Parses the provided [`ScalarToken`] as a string.
    ///
    /// # Errors
    ///
    /// If the `token` is not a string literal.
    pub fn parse_token<S: ScalarValue>(
        token: ScalarToken<'_>,
    ) -> ParseScalarResult<S> {
        <String as ParseScalarValue<S>>::from_str(token)
    }
}

#[cfg(test)]
mod spec {
    use juniper::{DefaultScalarValue, InputValue, Value};
    use service::domain::car;

    use crate::api::car::Plate;

    type Via = super::Via<car::Plate>;

    #[test]
    fn parses_plates_from_strings() {
        let input = InputValue::<DefaultScalarValue>::scalar("AB123CD");
        let plate: Plate = Via::from_input(&input).unwrap();
        assert_eq!(
            Via::to_output::<_, DefaultScalarValue>(&plate),
            Value::scalar("AB123CD".to_owned()),
        );

        let input = InputValue::<DefaultScalarValue>::scalar(42);
        let err = Via::from_input::<Plate, _>(&input).unwrap_err();
        assert!(err.contains("CarPlate"), "unexpected error: {err}");

        let input = InputValue::<DefaultScalarValue>::scalar("A--1");
        let err = Via::from_input::<Plate, _>(&input).unwrap_err();
        assert!(err.contains("invalid `Plate`"), "unexpected error: {err}");
    }
}
